use kurbo::{Point, Rect};

use crate::foundation::core::{GeoBounds, GeoPoint};
use crate::foundation::error::SkytraceResult;
use crate::geo::equirect::EquirectangularProjection;
use crate::geo::geos::{GeostationaryParams, GeostationaryProjection};
use crate::geo::projection::{AreaExtent, Projection};
use crate::scene::catalog::SatelliteScene;

const LIMB_BISECTION_STEPS: usize = 40;
const OUTLINE_SAMPLES_PER_EDGE: usize = 16;

/// Everything needed to map geographic coordinates onto one scene's pixel grid.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionDescriptor {
    Geostationary(GeostationaryParams),
    /// Regular lat/lon grid; `extent` gives the outer pixel edges.
    Equirectangular { extent: GeoBounds },
}

impl ProjectionDescriptor {
    pub fn validate(&self) -> SkytraceResult<()> {
        match self {
            Self::Geostationary(p) => p.validate(),
            Self::Equirectangular { extent } => extent.validate(),
        }
    }

    pub fn projection(&self) -> AnyProjection {
        match self {
            Self::Geostationary(p) => AnyProjection::Geostationary(GeostationaryProjection::new(p)),
            Self::Equirectangular { extent } => AnyProjection::Equirectangular(
                EquirectangularProjection::new((extent.min_lon_deg + extent.max_lon_deg) * 0.5),
            ),
        }
    }

    pub fn area_extent(&self) -> AreaExtent {
        match self {
            Self::Geostationary(p) => p.extent,
            Self::Equirectangular { extent } => AreaExtent::new(
                extent.min_lon_deg,
                extent.min_lat_deg,
                extent.max_lon_deg,
                extent.max_lat_deg,
            ),
        }
    }
}

/// Static dispatch over the supported geometry families.
#[derive(Clone, Copy, Debug)]
pub enum AnyProjection {
    Geostationary(GeostationaryProjection),
    Equirectangular(EquirectangularProjection),
}

impl Projection for AnyProjection {
    fn forward(&self, p: GeoPoint) -> Option<Point> {
        match self {
            Self::Geostationary(g) => g.forward(p),
            Self::Equirectangular(e) => e.forward(p),
        }
    }

    fn inverse(&self, xy: Point) -> Option<GeoPoint> {
        match self {
            Self::Geostationary(g) => g.inverse(xy),
            Self::Equirectangular(e) => e.inverse(xy),
        }
    }

    fn inverse_available(&self) -> bool {
        match self {
            Self::Geostationary(g) => g.inverse_available(),
            Self::Equirectangular(e) => e.inverse_available(),
        }
    }
}

/// Pixel position of a geographic point in one scene.
///
/// Pixel `i` spans `[i, i + 1)`, so its center is at `i + 0.5`. Points on the disk but outside
/// the raster keep their (out-of-range) coordinates with `visible = false`; points beyond the
/// limb have NaN coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
}

impl ProjectedPoint {
    pub fn visible(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visible: true,
        }
    }

    pub fn off_raster(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            visible: false,
        }
    }

    pub fn beyond_limb() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            visible: false,
        }
    }

    /// `true` when the point has a pixel position, even one outside the raster.
    pub fn has_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Projection bound to one scene's descriptor and raster size.
#[derive(Clone, Debug)]
pub struct SceneProjector {
    projection: AnyProjection,
    extent: AreaExtent,
    width: u32,
    height: u32,
}

impl SceneProjector {
    pub fn new(descriptor: &ProjectionDescriptor, width: u32, height: u32) -> Self {
        Self {
            projection: descriptor.projection(),
            extent: descriptor.area_extent(),
            width,
            height,
        }
    }

    pub fn for_scene(scene: &SatelliteScene) -> Self {
        Self::new(&scene.projection, scene.width(), scene.height())
    }

    pub fn raster_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn project(&self, p: GeoPoint) -> ProjectedPoint {
        match self.projection.forward(p) {
            Some(xy) => self.place(xy),
            None => ProjectedPoint::beyond_limb(),
        }
    }

    /// Pixel position of a projection-plane coordinate.
    fn place(&self, xy: Point) -> ProjectedPoint {
        let px = self.extent.to_pixel(xy, self.width, self.height);
        if !(px.x.is_finite() && px.y.is_finite()) {
            return ProjectedPoint::beyond_limb();
        }
        let inside = (0.0..f64::from(self.width)).contains(&px.x)
            && (0.0..f64::from(self.height)).contains(&px.y);
        if inside {
            ProjectedPoint::visible(px.x, px.y)
        } else {
            ProjectedPoint::off_raster(px.x, px.y)
        }
    }

    /// Geographic coordinate under a (fractional) pixel position.
    pub fn unproject(&self, px: Point) -> Option<GeoPoint> {
        if !self.projection.inverse_available() {
            return None;
        }
        self.projection
            .inverse(self.extent.from_pixel(px, self.width, self.height))
    }

    /// The two pixel-space pieces of `a → b` when it crosses a lat/lon grid's longitude seam.
    ///
    /// The first piece runs from `a` to the edge it leaves through, the second from the opposite
    /// edge to `b`. `None` when the path does not cross a seam.
    pub fn seam_split(
        &self,
        a: GeoPoint,
        b: GeoPoint,
    ) -> Option<[(ProjectedPoint, ProjectedPoint); 2]> {
        let AnyProjection::Equirectangular(e) = &self.projection else {
            return None;
        };
        let crossing = e.seam_crossing(a, b)?;
        Some([
            (self.project(a), self.place(crossing.exit)),
            (self.place(crossing.entry), self.project(b)),
        ])
    }

    /// Last on-disk point along `on_disk → beyond`, found by bisection.
    ///
    /// `None` if `on_disk` is itself beyond the limb.
    pub fn limb_crossing(&self, on_disk: GeoPoint, beyond: GeoPoint) -> Option<ProjectedPoint> {
        self.projection.forward(on_disk)?;
        let (mut lo, mut hi) = (0.0f64, 1.0f64);
        for _ in 0..LIMB_BISECTION_STEPS {
            let mid = (lo + hi) * 0.5;
            if self.projection.forward(on_disk.lerp(beyond, mid)).is_some() {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Some(self.project(on_disk.lerp(beyond, lo)))
    }

    /// Pixel bounding box of a geographic box, from its sampled outline.
    ///
    /// Outline samples beyond the limb are ignored; `None` if none of them is on the disk.
    pub fn pixel_bounds(&self, bounds: &GeoBounds) -> Option<Rect> {
        bounds
            .outline(OUTLINE_SAMPLES_PER_EDGE)
            .into_iter()
            .map(|g| self.project(g))
            .filter(ProjectedPoint::has_position)
            .map(|p| Rect::from_points(p.point(), p.point()))
            .reduce(|a, b| a.union(b))
    }
}

/// Stateless entry point: project `(lat, lon)` into `scene`.
pub struct GeoProjector;

impl GeoProjector {
    pub fn project(lat_deg: f64, lon_deg: f64, scene: &SatelliteScene) -> ProjectedPoint {
        SceneProjector::for_scene(scene).project(GeoPoint::new(lat_deg, lon_deg))
    }

    pub fn unproject(x: f64, y: f64, scene: &SatelliteScene) -> Option<GeoPoint> {
        SceneProjector::for_scene(scene).unproject(Point::new(x, y))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geo/projector.rs"]
mod tests;
