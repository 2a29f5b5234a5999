//! Raster storage and track overlay rendering.

pub mod clip;
pub mod color;
/// Premultiplied RGBA8 compositing.
pub mod composite;
pub mod draw;
/// Per-frame timestamp text.
pub mod label;
pub mod raster;
/// Trail and marker rendering onto scene copies.
pub mod track;
