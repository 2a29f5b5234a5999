use std::path::{Path, PathBuf};

use crate::encode::ffmpeg::ensure_parent_dir;
use crate::encode::sink::{FrameSink, SinkConfig, check_order};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::pipeline::generator::Frame;
use crate::render::raster::RasterBuf;

/// Write a raster as a straight-alpha RGBA8 PNG.
pub fn write_png(path: &Path, raster: &RasterBuf) -> SkytraceResult<()> {
    ensure_parent_dir(path)?;
    image::save_buffer_with_format(
        path,
        &raster.to_straight_rgba(),
        raster.width,
        raster.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| SkytraceError::encode(format!("write png '{}': {e}", path.display())))
}

/// Writes each frame to `<dir>/<NNNN>_<tag>.png`, numbered from 1 by grid index.
///
/// Existing files are left alone unless `overwrite` is set, so an interrupted run can be resumed
/// without rendering those timesteps again.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    tag: String,
    overwrite: bool,
    last_idx: Option<FrameIndex>,
    written: Vec<PathBuf>,
    kept: usize,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, tag: impl Into<String>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            tag: tag.into(),
            overwrite,
            last_idx: None,
            written: Vec::new(),
            kept: 0,
        }
    }

    pub fn path_for(&self, idx: FrameIndex) -> PathBuf {
        self.dir.join(format!("{:04}_{}.png", idx.0 + 1, self.tag))
    }

    /// Files written by this sink, in order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Frames not written because their file already existed.
    pub fn kept(&self) -> usize {
        self.kept
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, _cfg: SinkConfig) -> SkytraceResult<()> {
        if self.tag.contains(['/', '\\']) {
            return Err(SkytraceError::validation(format!(
                "png tag '{}' must not contain path separators",
                self.tag
            )));
        }
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            SkytraceError::encode(format!(
                "create output directory '{}': {e}",
                self.dir.display()
            ))
        })?;
        self.last_idx = None;
        self.written.clear();
        self.kept = 0;
        Ok(())
    }

    fn wants(&self, index: FrameIndex) -> bool {
        self.overwrite || !self.path_for(index).exists()
    }

    fn push_frame(&mut self, frame: &Frame) -> SkytraceResult<()> {
        check_order(self.last_idx, frame.index)?;
        self.last_idx = Some(frame.index);

        let path = self.path_for(frame.index);
        if !self.overwrite && path.exists() {
            tracing::debug!(path = %path.display(), "keeping existing frame");
            self.kept += 1;
            return Ok(());
        }
        write_png(&path, &frame.raster)?;
        self.written.push(path);
        Ok(())
    }

    fn end(&mut self) -> SkytraceResult<()> {
        tracing::info!(
            dir = %self.dir.display(),
            written = self.written.len(),
            kept = self.kept,
            "png sequence complete"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
