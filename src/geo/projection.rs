use kurbo::Point;

use crate::foundation::core::GeoPoint;
use crate::foundation::error::{SkytraceError, SkytraceResult};

/// Geometry family of a scene: geographic ↔ projection-plane coordinates.
///
/// Projection-plane units are family specific. Mapping to pixels goes through the descriptor's
/// extent, see [`crate::geo::projector::SceneProjector`].
pub trait Projection {
    /// `None` when the point cannot be seen in this geometry (e.g. beyond the limb).
    fn forward(&self, p: GeoPoint) -> Option<Point>;
    /// `None` when the plane coordinate does not hit the Earth.
    fn inverse(&self, xy: Point) -> Option<GeoPoint>;
    fn inverse_available(&self) -> bool {
        true
    }
}

/// Outer edges of the raster in projection-plane coordinates.
///
/// `ll` is the lower-left corner of the lower-left pixel, `ur` the upper-right corner of the
/// upper-right pixel; plane `y` grows northward while raster rows grow southward.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AreaExtent {
    pub ll_x: f64,
    pub ll_y: f64,
    pub ur_x: f64,
    pub ur_y: f64,
}

impl AreaExtent {
    pub fn new(ll_x: f64, ll_y: f64, ur_x: f64, ur_y: f64) -> Self {
        Self {
            ll_x,
            ll_y,
            ur_x,
            ur_y,
        }
    }

    /// Symmetric extent around the projection origin.
    pub fn symmetric(half_x: f64, half_y: f64) -> Self {
        Self::new(-half_x, -half_y, half_x, half_y)
    }

    pub fn validate(&self) -> SkytraceResult<()> {
        let all = [self.ll_x, self.ll_y, self.ur_x, self.ur_y];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(SkytraceError::validation("area extent must be finite"));
        }
        if self.ll_x >= self.ur_x || self.ll_y >= self.ur_y {
            return Err(SkytraceError::validation(
                "area extent lower-left must be below and left of upper-right",
            ));
        }
        Ok(())
    }

    /// Plane coordinate → fractional pixel coordinate (pixel `i` spans `[i, i + 1)`).
    pub fn to_pixel(&self, xy: Point, width: u32, height: u32) -> Point {
        Point::new(
            (xy.x - self.ll_x) / (self.ur_x - self.ll_x) * f64::from(width),
            (self.ur_y - xy.y) / (self.ur_y - self.ll_y) * f64::from(height),
        )
    }

    pub fn from_pixel(&self, px: Point, width: u32, height: u32) -> Point {
        Point::new(
            self.ll_x + px.x / f64::from(width) * (self.ur_x - self.ll_x),
            self.ur_y - px.y / f64::from(height) * (self.ur_y - self.ll_y),
        )
    }
}
