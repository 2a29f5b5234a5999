//! Geographic ↔ pixel mapping for scene geometries.

pub mod equirect;
/// Normalized geostationary projection.
pub mod geos;
pub mod projection;
/// Scene-bound projection, visibility and limb handling.
pub mod projector;
