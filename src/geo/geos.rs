use kurbo::Point;

use crate::foundation::core::GeoPoint;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::foundation::math::{lon_delta_deg, wrap_lon_deg};
use crate::geo::projection::{AreaExtent, Projection};

pub const WGS84_SEMI_MAJOR_M: f64 = 6_378_137.0;
pub const WGS84_SEMI_MINOR_M: f64 = 6_356_752.314_245;
/// Nominal geostationary orbit height above the equator.
pub const GEO_HEIGHT_M: f64 = 35_785_831.0;

/// Axis the instrument sweeps first.
///
/// `Y` for Himawari/Meteosat-type scanners, `X` for GOES-R ABI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sweep {
    X,
    #[default]
    Y,
}

fn default_height() -> f64 {
    GEO_HEIGHT_M
}

fn default_semi_major() -> f64 {
    WGS84_SEMI_MAJOR_M
}

fn default_semi_minor() -> f64 {
    WGS84_SEMI_MINOR_M
}

/// Normalized geostationary viewing geometry.
///
/// Plane coordinates are scan angles (radians) multiplied by `satellite_height_m`, so a
/// `full_disk` extent is about ±5.43 Mm.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeostationaryParams {
    pub sub_lon_deg: f64,
    #[serde(default = "default_height")]
    pub satellite_height_m: f64,
    #[serde(default = "default_semi_major")]
    pub semi_major_m: f64,
    #[serde(default = "default_semi_minor")]
    pub semi_minor_m: f64,
    #[serde(default)]
    pub sweep: Sweep,
    pub extent: AreaExtent,
}

impl GeostationaryParams {
    /// Whole visible disk on a WGS84 Earth, edge to edge.
    pub fn full_disk(sub_lon_deg: f64) -> Self {
        let edge = Self::max_scan_angle(WGS84_SEMI_MAJOR_M, GEO_HEIGHT_M) * GEO_HEIGHT_M;
        Self {
            sub_lon_deg,
            satellite_height_m: GEO_HEIGHT_M,
            semi_major_m: WGS84_SEMI_MAJOR_M,
            semi_minor_m: WGS84_SEMI_MINOR_M,
            sweep: Sweep::Y,
            extent: AreaExtent::symmetric(edge, edge),
        }
    }

    pub fn validate(&self) -> SkytraceResult<()> {
        if !self.sub_lon_deg.is_finite() || !(-180.0..=180.0).contains(&self.sub_lon_deg) {
            return Err(SkytraceError::validation(
                "geostationary sub_lon_deg must be within [-180, 180]",
            ));
        }
        if !(self.semi_major_m > 0.0 && self.semi_minor_m > 0.0)
            || self.semi_minor_m > self.semi_major_m
        {
            return Err(SkytraceError::validation(
                "geostationary ellipsoid needs 0 < semi_minor_m <= semi_major_m",
            ));
        }
        if !(self.satellite_height_m.is_finite() && self.satellite_height_m > 0.0) {
            return Err(SkytraceError::validation(
                "geostationary satellite_height_m must be > 0",
            ));
        }
        self.extent.validate()
    }

    /// Angular radius of the visible disk as seen from the satellite.
    pub fn disk_radius_rad(&self) -> f64 {
        Self::max_scan_angle(self.semi_major_m, self.satellite_height_m)
    }

    fn max_scan_angle(a: f64, h: f64) -> f64 {
        (a / (a + h)).asin()
    }
}

/// Forward/inverse geostationary projection on an ellipsoid.
///
/// Works in units of the semi-major axis: the satellite sits at distance `radius_g` from the
/// Earth's center on the x axis.
#[derive(Clone, Copy, Debug)]
pub struct GeostationaryProjection {
    sub_lon_deg: f64,
    a: f64,
    sweep: Sweep,
    radius_g: f64,
    radius_g_1: f64,
    c: f64,
    radius_p: f64,
    radius_p2: f64,
    radius_p_inv2: f64,
}

impl GeostationaryProjection {
    pub fn new(params: &GeostationaryParams) -> Self {
        let a = params.semi_major_m;
        let radius_g_1 = params.satellite_height_m / a;
        let radius_g = 1.0 + radius_g_1;
        let radius_p = params.semi_minor_m / a;
        let radius_p2 = radius_p * radius_p;
        Self {
            sub_lon_deg: params.sub_lon_deg,
            a,
            sweep: params.sweep,
            radius_g,
            radius_g_1,
            c: radius_g * radius_g - 1.0,
            radius_p,
            radius_p2,
            radius_p_inv2: 1.0 / radius_p2,
        }
    }
}

impl Projection for GeostationaryProjection {
    fn forward(&self, p: GeoPoint) -> Option<Point> {
        let lam = lon_delta_deg(self.sub_lon_deg, p.lon_deg).to_radians();
        // Geodetic → geocentric latitude.
        let phi = (self.radius_p2 * p.lat_deg.to_radians().tan()).atan();

        let r = self.radius_p / (self.radius_p * phi.cos()).hypot(phi.sin());
        let vx = r * lam.cos() * phi.cos();
        let vy = r * lam.sin() * phi.cos();
        let vz = r * phi.sin();

        // Limb: the line of sight must not pass through the ellipsoid before reaching the point.
        if (self.radius_g - vx) * vx - vy * vy - vz * vz * self.radius_p_inv2 < 0.0 {
            return None;
        }

        let tmp = self.radius_g - vx;
        let (x, y) = match self.sweep {
            Sweep::Y => (
                self.radius_g_1 * (vy / tmp).atan(),
                self.radius_g_1 * (vz / vy.hypot(tmp)).atan(),
            ),
            Sweep::X => (
                self.radius_g_1 * (vy / vz.hypot(tmp)).atan(),
                self.radius_g_1 * (vz / tmp).atan(),
            ),
        };
        Some(Point::new(x * self.a, y * self.a))
    }

    fn inverse(&self, xy: Point) -> Option<GeoPoint> {
        let x = xy.x / self.a;
        let y = xy.y / self.a;

        let mut vx = -1.0;
        let (mut vy, mut vz) = match self.sweep {
            Sweep::Y => {
                let vy = (x / self.radius_g_1).tan();
                (vy, (y / self.radius_g_1).tan() * 1.0f64.hypot(vy))
            }
            Sweep::X => {
                let vz = (y / self.radius_g_1).tan();
                ((x / self.radius_g_1).tan() * 1.0f64.hypot(vz), vz)
            }
        };

        // Intersect the viewing ray with the ellipsoid.
        let qa = vy * vy + (vz / self.radius_p).powi(2) + vx * vx;
        let qb = 2.0 * self.radius_g * vx;
        let det = qb * qb - 4.0 * qa * self.c;
        if det < 0.0 {
            return None;
        }
        let k = (-qb - det.sqrt()) / (2.0 * qa);
        vx = self.radius_g + k * vx;
        vy *= k;
        vz *= k;

        let lam = vy.atan2(vx);
        // Geocentric → geodetic latitude.
        let phi = (self.radius_p_inv2 * vz * lam.cos() / vx).atan();
        Some(GeoPoint::new(
            phi.to_degrees(),
            wrap_lon_deg(lam.to_degrees() + self.sub_lon_deg),
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geo/geos.rs"]
mod tests;
