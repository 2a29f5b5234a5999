use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::render::color::StyleColor;
use crate::render::composite::over_in_place;
use crate::render::draw::Overlay;
use crate::render::raster::RasterBuf;

const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn default_color() -> StyleColor {
    StyleColor::rgba(1.0, 0.0, 0.0, 1.0)
}

fn default_size() -> f64 {
    15.0
}

fn default_pos() -> [f64; 2] {
    [0.04, 0.92]
}

/// Timestamp printed on every frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeLabel {
    /// TrueType or OpenType font file.
    pub font: PathBuf,
    #[serde(default = "default_color")]
    pub color: StyleColor,
    #[serde(default = "default_size")]
    pub size_px: f64,
    /// Start of the baseline, as fractions of the frame measured from its lower-left corner.
    #[serde(default = "default_pos")]
    pub pos: [f64; 2],
}

impl TimeLabel {
    pub fn new(font: impl Into<PathBuf>) -> Self {
        Self {
            font: font.into(),
            color: default_color(),
            size_px: default_size(),
            pos: default_pos(),
        }
    }

    pub fn validate(&self) -> SkytraceResult<()> {
        if !(self.size_px.is_finite() && self.size_px > 0.0) {
            return Err(SkytraceError::validation(
                "time label size_px must be finite and > 0",
            ));
        }
        if !self.pos.iter().all(|v| v.is_finite()) {
            return Err(SkytraceError::validation("time label pos must be finite"));
        }
        Ok(())
    }
}

/// A [`TimeLabel`] with its font loaded.
#[derive(Clone)]
pub struct LabelPainter {
    style: TimeLabel,
    font_bytes: Vec<u8>,
    font: vello_cpu::peniko::FontData,
}

impl LabelPainter {
    pub fn load(style: &TimeLabel) -> SkytraceResult<Self> {
        let bytes = std::fs::read(&style.font)
            .with_context(|| format!("read label font '{}'", style.font.display()))?;
        Self::from_font_bytes(style.clone(), bytes)
    }

    pub fn from_font_bytes(style: TimeLabel, font_bytes: Vec<u8>) -> SkytraceResult<Self> {
        style.validate()?;
        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes.clone()), 0);
        let painter = Self {
            style,
            font_bytes,
            font,
        };
        painter.layout("0")?;
        Ok(painter)
    }

    pub fn style(&self) -> &TimeLabel {
        &self.style
    }

    // Contexts are rebuilt per call so one painter can serve every worker thread.
    fn layout(&self, text: &str) -> SkytraceResult<parley::Layout<[u8; 4]>> {
        let mut font_ctx = parley::FontContext::default();
        let mut layout_ctx = parley::LayoutContext::new();

        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(self.font_bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            SkytraceError::validation(format!(
                "no font family in label font '{}'",
                self.style.font.display()
            ))
        })?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| SkytraceError::validation("label font family has no name"))?
            .to_string();

        let mut builder = layout_ctx.ranged_builder(&mut font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(
            self.style.size_px as f32,
        ));
        let mut layout: parley::Layout<[u8; 4]> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Print `t` onto `raster`, above everything already drawn.
    pub fn paint(&self, raster: &mut RasterBuf, t: DateTime<Utc>) -> SkytraceResult<()> {
        let text = t.format(LABEL_FORMAT).to_string();
        let layout = self.layout(&text)?;
        let baseline = layout
            .lines()
            .next()
            .map_or(0.0, |line| f64::from(line.metrics().baseline));
        let origin = Point::new(
            self.style.pos[0] * f64::from(raster.width),
            (1.0 - self.style.pos[1]) * f64::from(raster.height) - baseline,
        );

        let color = self.style.color.to_rgba8_premul();
        let mut overlay = Overlay::new(raster.width, raster.height)?;
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                overlay.glyphs(&self.font, run.run().font_size(), origin, color, glyphs);
            }
        }
        over_in_place(&mut raster.data, &overlay.finish())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/label.rs"]
mod tests;
