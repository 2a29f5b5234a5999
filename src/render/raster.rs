use std::sync::Arc;

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{SkytraceError, SkytraceResult};

/// Read-only pixel access to a scene image.
///
/// Pixels are premultiplied RGBA8. Implementations are shared between workers, so they must be
/// `Send + Sync`.
pub trait Raster: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Pixel at `(x, y)`; out-of-bounds reads return transparent black.
    fn pixel(&self, x: u32, y: u32) -> [u8; 4];

    /// Copy into an owned buffer.
    fn to_buf(&self) -> RasterBuf {
        let (w, h) = (self.width(), self.height());
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&self.pixel(x, y));
            }
        }
        RasterBuf {
            width: w,
            height: h,
            data,
        }
    }
}

pub type SharedRaster = Arc<dyn Raster>;

/// Owned premultiplied RGBA8 image, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterBuf {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterBuf {
    /// Transparent image.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Rgba8Premul::transparent())
    }

    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> Self {
        Self {
            width,
            height,
            data: color.to_array().repeat(width as usize * height as usize),
        }
    }

    pub fn from_premul_bytes(width: u32, height: u32, data: Vec<u8>) -> SkytraceResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| SkytraceError::validation("raster size overflow"))?;
        if data.len() != expected {
            return Err(SkytraceError::validation(format!(
                "raster byte length {} does not match {width}x{height}x4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Premultiply straight-alpha RGBA8 bytes.
    pub fn from_straight_rgba(width: u32, height: u32, rgba: &[u8]) -> SkytraceResult<Self> {
        let data = rgba
            .chunks_exact(4)
            .flat_map(|px| Rgba8Premul::from_straight_rgba(px[0], px[1], px[2], px[3]).to_array())
            .collect();
        Self::from_premul_bytes(width, height, data)
    }

    pub fn to_straight_rgba(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .flat_map(|px| Rgba8Premul::from_array([px[0], px[1], px[2], px[3]]).to_straight_rgba())
            .collect()
    }

    /// Sub-image clamped to the raster bounds; `None` if the clamped rect is empty.
    pub fn crop(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Option<RasterBuf> {
        let (x1, y1) = (x1.min(self.width), y1.min(self.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        let (w, h) = (x1 - x0, y1 - y0);
        let stride = self.width as usize * 4;
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in y0..y1 {
            let row = y as usize * stride;
            data.extend_from_slice(&self.data[row + x0 as usize * 4..row + x1 as usize * 4]);
        }
        Some(RasterBuf {
            width: w,
            height: h,
            data,
        })
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }
}

impl Raster for RasterBuf {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        match self.index(x, y) {
            Some(i) => [
                self.data[i],
                self.data[i + 1],
                self.data[i + 2],
                self.data[i + 3],
            ],
            None => [0, 0, 0, 0],
        }
    }

    fn to_buf(&self) -> RasterBuf {
        self.clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
