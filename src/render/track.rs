use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::geo::projector::ProjectedPoint;
use crate::render::clip::clip_segment;
use crate::render::color::{ColorScale, StyleColor};
use crate::render::composite::over_in_place;
use crate::render::draw::{MarkerShape, Overlay};
use crate::render::raster::{Raster, RasterBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    /// Outer radius in pixels.
    pub size_px: f64,
    pub color: StyleColor,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            shape: MarkerShape::Star,
            size_px: 6.0,
            color: StyleColor::rgba(1.0, 0.0, 0.0, 1.0),
        }
    }
}

impl MarkerStyle {
    fn validate(&self, what: &str) -> SkytraceResult<()> {
        if !(self.size_px.is_finite() && self.size_px >= 0.0) {
            return Err(SkytraceError::validation(format!(
                "{what} marker size must be finite and >= 0"
            )));
        }
        Ok(())
    }
}

/// Appearance of the trail and markers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackStyle {
    pub line_width_px: f64,
    pub color_scale: ColorScale,
    pub start_marker: MarkerStyle,
    pub end_marker: MarkerStyle,
    pub current_marker: MarkerStyle,
    pub draw_trail: bool,
    pub draw_start_end: bool,
}

impl Default for TrackStyle {
    fn default() -> Self {
        Self {
            line_width_px: 2.0,
            color_scale: ColorScale::default(),
            start_marker: MarkerStyle::default(),
            end_marker: MarkerStyle::default(),
            current_marker: MarkerStyle {
                size_px: 12.0,
                ..MarkerStyle::default()
            },
            draw_trail: true,
            draw_start_end: true,
        }
    }
}

impl TrackStyle {
    pub fn validate(&self) -> SkytraceResult<()> {
        if !(self.line_width_px.is_finite() && self.line_width_px > 0.0) {
            return Err(SkytraceError::validation(
                "track line_width_px must be finite and > 0",
            ));
        }
        self.color_scale.validate()?;
        self.start_marker.validate("start")?;
        self.end_marker.validate("end")?;
        self.current_marker.validate("current")
    }
}

/// Projected trajectory sample, with the altitude that colors its segments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackVertex {
    pub projected: ProjectedPoint,
    pub altitude: f64,
}

/// Consecutive pair of projected samples. `altitude` is the mean of the two endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSegment {
    pub start: ProjectedPoint,
    pub end: ProjectedPoint,
    pub altitude: f64,
}

impl TrackSegment {
    pub fn between(a: &TrackVertex, b: &TrackVertex) -> Self {
        Self {
            start: a.projected,
            end: b.projected,
            altitude: (a.altitude + b.altitude) * 0.5,
        }
    }
}

/// Everything the renderer draws on top of one scene, already in pixel space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectedTrack {
    pub segments: Vec<TrackSegment>,
    /// First recorded trajectory point.
    pub start: Option<ProjectedPoint>,
    /// Last recorded trajectory point.
    pub end: Option<ProjectedPoint>,
}

impl ProjectedTrack {
    pub fn from_vertices(
        vertices: &[TrackVertex],
        start: Option<ProjectedPoint>,
        end: Option<ProjectedPoint>,
    ) -> Self {
        Self {
            segments: vertices
                .windows(2)
                .map(|w| TrackSegment::between(&w[0], &w[1]))
                .collect(),
            start,
            end,
        }
    }
}

/// Composites the altitude-colored trail and markers over a copy of a scene raster.
#[derive(Clone, Debug)]
pub struct TrackRenderer {
    style: TrackStyle,
}

impl TrackRenderer {
    pub fn new(style: TrackStyle) -> SkytraceResult<Self> {
        style.validate()?;
        Ok(Self { style })
    }

    pub fn style(&self) -> &TrackStyle {
        &self.style
    }

    pub fn segment_color(&self, segment: &TrackSegment) -> Rgba8Premul {
        self.style.color_scale.color_at(segment.altitude)
    }

    /// Pixel span to draw for `segment`, if any.
    ///
    /// Both endpoints visible: the whole segment. One visible and the other positioned off the
    /// raster: the part inside `rect`. Otherwise nothing.
    pub fn drawable_span(segment: &TrackSegment, rect: Rect) -> Option<(Point, Point)> {
        let (a, b) = (segment.start, segment.end);
        match (a.visible, b.visible) {
            (true, true) => Some((a.point(), b.point())),
            (true, false) if b.has_position() => clip_segment(a.point(), b.point(), rect),
            (false, true) if a.has_position() => clip_segment(a.point(), b.point(), rect),
            _ => None,
        }
    }

    /// Base copy, trail, start marker, end marker, then the current position on top.
    ///
    /// `base` is never modified.
    #[tracing::instrument(level = "trace", skip_all, fields(segments = track.segments.len()))]
    pub fn render(
        &self,
        base: &dyn Raster,
        track: &ProjectedTrack,
        current: &ProjectedPoint,
    ) -> SkytraceResult<RasterBuf> {
        let mut out = base.to_buf();
        let mut overlay = Overlay::new(out.width, out.height)?;
        let rect = Rect::new(0.0, 0.0, f64::from(out.width), f64::from(out.height));

        if self.style.draw_trail {
            for seg in &track.segments {
                if let Some((a, b)) = Self::drawable_span(seg, rect) {
                    overlay.segment(a, b, self.style.line_width_px, self.segment_color(seg));
                }
            }
        }

        if self.style.draw_start_end {
            for (p, m) in [
                (track.start, &self.style.start_marker),
                (track.end, &self.style.end_marker),
            ] {
                if let Some(p) = p.filter(|p| p.visible) {
                    overlay.marker(p.point(), m.shape, m.size_px, m.color.to_rgba8_premul());
                }
            }
        }

        if current.visible {
            let m = &self.style.current_marker;
            overlay.marker(current.point(), m.shape, m.size_px, m.color.to_rgba8_premul());
        }

        over_in_place(&mut out.data, &overlay.finish())?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/track.rs"]
mod tests;
