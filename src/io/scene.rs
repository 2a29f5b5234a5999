use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, Utc};

use crate::foundation::error::SkytraceResult;
use crate::geo::projector::ProjectionDescriptor;
use crate::render::raster::RasterBuf;
use crate::scene::catalog::SatelliteScene;

/// Decode a PNG/JPEG (or any format `image` reads) into a premultiplied raster.
pub fn load_raster(path: &Path) -> SkytraceResult<RasterBuf> {
    let img = image::open(path)
        .with_context(|| format!("decode scene image '{}'", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    RasterBuf::from_straight_rgba(w, h, img.as_raw())
}

/// Load an image as a scene. The id defaults to the file stem.
pub fn load_scene(
    path: &Path,
    id: Option<String>,
    timestamp: DateTime<Utc>,
    projection: ProjectionDescriptor,
) -> SkytraceResult<SatelliteScene> {
    let raster = load_raster(path)?;
    let id = id.unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });
    tracing::debug!(%id, %timestamp, width = raster.width, height = raster.height, "scene loaded");
    Ok(SatelliteScene::new(
        id,
        timestamp,
        projection,
        std::sync::Arc::new(raster),
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/io/scene.rs"]
mod tests;
