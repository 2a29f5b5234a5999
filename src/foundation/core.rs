use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::foundation::math::{lon_delta_deg, wrap_lon_deg};

pub use kurbo::{Point, Rect};

/// 0-based position of a timestep on the output time grid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// WGS84 geographic coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    /// Latitude, positive north.
    pub lat_deg: f64,
    /// Longitude, positive east, in `[-180, 180]`.
    pub lon_deg: f64,
}

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Interpolate toward `other` along the shorter longitude path.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lat_deg: self.lat_deg + (other.lat_deg - self.lat_deg) * t,
            lon_deg: wrap_lon_deg(self.lon_deg + lon_delta_deg(self.lon_deg, other.lon_deg) * t),
        }
    }

    pub fn is_valid(self) -> bool {
        self.lat_deg.is_finite()
            && self.lon_deg.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lon_deg)
    }
}

/// Latitude/longitude bounding box.
///
/// `max_lon_deg` may exceed 180 for boxes that cross the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoBounds {
    pub min_lat_deg: f64,
    pub max_lat_deg: f64,
    pub min_lon_deg: f64,
    pub max_lon_deg: f64,
}

impl GeoBounds {
    pub fn new(
        min_lat_deg: f64,
        max_lat_deg: f64,
        min_lon_deg: f64,
        max_lon_deg: f64,
    ) -> SkytraceResult<Self> {
        let b = Self {
            min_lat_deg,
            max_lat_deg,
            min_lon_deg,
            max_lon_deg,
        };
        b.validate()?;
        Ok(b)
    }

    pub fn validate(&self) -> SkytraceResult<()> {
        let all = [
            self.min_lat_deg,
            self.max_lat_deg,
            self.min_lon_deg,
            self.max_lon_deg,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(SkytraceError::validation("GeoBounds must be finite"));
        }
        if self.min_lat_deg >= self.max_lat_deg || self.min_lon_deg >= self.max_lon_deg {
            return Err(SkytraceError::validation(
                "GeoBounds min must be < max on both axes",
            ));
        }
        if self.min_lat_deg < -90.0 || self.max_lat_deg > 90.0 {
            return Err(SkytraceError::validation(
                "GeoBounds latitude must be within [-90, 90]",
            ));
        }
        if self.max_lon_deg - self.min_lon_deg > 360.0 {
            return Err(SkytraceError::validation(
                "GeoBounds longitude span must not exceed 360 degrees",
            ));
        }
        Ok(())
    }

    /// Degenerate box holding a single point.
    pub fn of_point(p: GeoPoint) -> Self {
        Self {
            min_lat_deg: p.lat_deg,
            max_lat_deg: p.lat_deg,
            min_lon_deg: p.lon_deg,
            max_lon_deg: p.lon_deg,
        }
    }

    pub fn including(self, p: GeoPoint) -> Self {
        Self {
            min_lat_deg: self.min_lat_deg.min(p.lat_deg),
            max_lat_deg: self.max_lat_deg.max(p.lat_deg),
            min_lon_deg: self.min_lon_deg.min(p.lon_deg),
            max_lon_deg: self.max_lon_deg.max(p.lon_deg),
        }
    }

    /// Smallest box containing every point, without antimeridian handling.
    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        Some(it.fold(Self::of_point(first), Self::including))
    }

    /// Grow each axis by a fraction of its span on both sides.
    ///
    /// A 20 degree latitude span with `lat_frac = 0.1` gains 2 degrees at the top and bottom.
    pub fn buffered(self, lat_frac: f64, lon_frac: f64) -> Self {
        let dlat = (self.max_lat_deg - self.min_lat_deg) * lat_frac;
        let dlon = (self.max_lon_deg - self.min_lon_deg) * lon_frac;
        Self {
            min_lat_deg: (self.min_lat_deg - dlat).max(-90.0),
            max_lat_deg: (self.max_lat_deg + dlat).min(90.0),
            min_lon_deg: self.min_lon_deg - dlon,
            max_lon_deg: self.max_lon_deg + dlon,
        }
    }

    /// Fixed-size box centered on `center`.
    pub fn around(center: GeoPoint, lat_half_deg: f64, lon_half_deg: f64) -> Self {
        Self {
            min_lat_deg: (center.lat_deg - lat_half_deg).max(-90.0),
            max_lat_deg: (center.lat_deg + lat_half_deg).min(90.0),
            min_lon_deg: center.lon_deg - lon_half_deg,
            max_lon_deg: center.lon_deg + lon_half_deg,
        }
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat_deg + self.max_lat_deg) * 0.5,
            wrap_lon_deg((self.min_lon_deg + self.max_lon_deg) * 0.5),
        )
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat_deg - self.min_lat_deg
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon_deg - self.min_lon_deg
    }

    /// Points along the box outline, `per_edge + 1` samples per side (corners included).
    pub fn outline(&self, per_edge: usize) -> Vec<GeoPoint> {
        let n = per_edge.max(1);
        let mut out = Vec::with_capacity((n + 1) * 4);
        for i in 0..=n {
            let t = i as f64 / n as f64;
            let lon = wrap_lon_deg(self.min_lon_deg + self.lon_span() * t);
            let lat = self.min_lat_deg + self.lat_span() * t;
            out.push(GeoPoint::new(self.min_lat_deg, lon));
            out.push(GeoPoint::new(self.max_lat_deg, lon));
            out.push(GeoPoint::new(lat, wrap_lon_deg(self.min_lon_deg)));
            out.push(GeoPoint::new(lat, wrap_lon_deg(self.max_lon_deg)));
        }
        out
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Undo premultiplication; fully transparent pixels become transparent black.
    pub fn to_straight_rgba(self) -> [u8; 4] {
        if self.a == 0 {
            return [0, 0, 0, 0];
        }
        let unpremul = |c: u8| -> u8 {
            let v = (u32::from(c) * 255 + u32::from(self.a) / 2) / u32::from(self.a);
            v.min(255) as u8
        };
        [unpremul(self.r), unpremul(self.g), unpremul(self.b), self.a]
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
