use kurbo::Point;

use crate::foundation::core::GeoPoint;
use crate::foundation::math::{lerp, lon_delta_deg, wrap_lon_deg};
use crate::geo::projection::Projection;

/// Plate carrée: plane `x` is longitude, plane `y` latitude, both in degrees.
///
/// Longitudes are unwrapped into `[center - 180, center + 180)` so grids crossing the
/// antimeridian stay contiguous. The meridian opposite the center is the seam: it always lands
/// on the western edge of that range.
#[derive(Clone, Copy, Debug)]
pub struct EquirectangularProjection {
    center_lon_deg: f64,
}

/// Where a path leaves the plane at one side of the seam and re-enters at the other.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeamCrossing {
    pub exit: Point,
    pub entry: Point,
}

impl EquirectangularProjection {
    pub fn new(center_lon_deg: f64) -> Self {
        Self { center_lon_deg }
    }

    fn unwrap_lon(&self, lon_deg: f64) -> f64 {
        let d = lon_delta_deg(self.center_lon_deg, lon_deg);
        let d = if d >= 180.0 { d - 360.0 } else { d };
        self.center_lon_deg + d
    }

    /// Seam crossing of the shorter path `a → b`, if it has one.
    pub fn seam_crossing(&self, a: GeoPoint, b: GeoPoint) -> Option<SeamCrossing> {
        if !(a.is_valid() && b.is_valid()) {
            return None;
        }
        let xa = self.unwrap_lon(a.lon_deg);
        let d = lon_delta_deg(a.lon_deg, b.lon_deg);
        let xb = xa + d;
        let (east, west) = (self.center_lon_deg + 180.0, self.center_lon_deg - 180.0);
        let (exit_x, entry_x) = if xb >= east {
            (east, west)
        } else if xb < west {
            (west, east)
        } else {
            return None;
        };
        let f = (exit_x - xa) / d;
        let lat = lerp(a.lat_deg, b.lat_deg, f);
        Some(SeamCrossing {
            exit: Point::new(exit_x, lat),
            entry: Point::new(entry_x, lat),
        })
    }
}

impl Projection for EquirectangularProjection {
    fn forward(&self, p: GeoPoint) -> Option<Point> {
        if !p.is_valid() {
            return None;
        }
        Some(Point::new(self.unwrap_lon(p.lon_deg), p.lat_deg))
    }

    fn inverse(&self, xy: Point) -> Option<GeoPoint> {
        if !(-90.0..=90.0).contains(&xy.y) || !xy.x.is_finite() {
            return None;
        }
        Some(GeoPoint::new(xy.y, wrap_lon_deg(xy.x)))
    }
}
