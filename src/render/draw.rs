use kurbo::{BezPath, Circle, PathEl, Point, Shape as _, Vec2};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{SkytraceError, SkytraceResult};

/// Marker glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    #[default]
    Star,
    Circle,
    Cross,
}

const STAR_INNER_RATIO: f64 = 0.45;
const CROSS_BAR_RATIO: f64 = 0.35;
const PATH_TOLERANCE: f64 = 0.1;

/// Anti-aliased vector overlay, rasterized on a transparent surface.
pub(crate) struct Overlay {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl Overlay {
    pub(crate) fn new(width: u32, height: u32) -> SkytraceResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| SkytraceError::render("overlay width exceeds u16"))?;
        let height: u16 = height
            .try_into()
            .map_err(|_| SkytraceError::render("overlay height exceeds u16"))?;
        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        Ok(Self { ctx, width, height })
    }

    fn fill(&mut self, path: &BezPath, color: Rgba8Premul) {
        let [r, g, b, a] = color.to_straight_rgba();
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    /// Thick line with round caps, so consecutive segments join without gaps.
    pub(crate) fn segment(&mut self, a: Point, b: Point, width_px: f64, color: Rgba8Premul) {
        let half = width_px * 0.5;
        let d = b - a;
        let len = d.hypot();
        if len > f64::EPSILON {
            let n = Vec2::new(-d.y, d.x) * (half / len);
            self.fill(&polygon(&[a + n, b + n, b - n, a - n]), color);
        }
        self.fill(&Circle::new(a, half).to_path(PATH_TOLERANCE), color);
        self.fill(&Circle::new(b, half).to_path(PATH_TOLERANCE), color);
    }

    pub(crate) fn marker(&mut self, at: Point, shape: MarkerShape, size_px: f64, color: Rgba8Premul) {
        let r = size_px.max(0.0);
        match shape {
            MarkerShape::Circle => {
                self.fill(&Circle::new(at, r).to_path(PATH_TOLERANCE), color);
            }
            MarkerShape::Star => self.fill(&star(at, r, r * STAR_INNER_RATIO), color),
            MarkerShape::Cross => {
                let k = r * std::f64::consts::FRAC_1_SQRT_2;
                let bar = r * CROSS_BAR_RATIO;
                self.bar(at + Vec2::new(-k, -k), at + Vec2::new(k, k), bar, color);
                self.bar(at + Vec2::new(-k, k), at + Vec2::new(k, -k), bar, color);
            }
        }
    }

    fn bar(&mut self, a: Point, b: Point, width_px: f64, color: Rgba8Premul) {
        let d = b - a;
        let len = d.hypot();
        if len <= f64::EPSILON {
            return;
        }
        let n = Vec2::new(-d.y, d.x) * (width_px * 0.5 / len);
        self.fill(&polygon(&[a + n, b + n, b - n, a - n]), color);
    }

    /// Fill a shaped glyph run whose positions are relative to `origin`.
    pub(crate) fn glyphs(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        size_px: f32,
        origin: Point,
        color: Rgba8Premul,
        glyphs: impl Iterator<Item = vello_cpu::Glyph>,
    ) {
        let [r, g, b, a] = color.to_straight_rgba();
        self.ctx
            .set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::translate((origin.x, origin.y)));
        self.ctx.glyph_run(font).font_size(size_px).fill_glyphs(glyphs);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Rasterize and return premultiplied RGBA8 bytes.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        pixmap.data_as_u8_slice().to_vec()
    }
}

fn polygon(pts: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = pts.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

/// Five-pointed star, first point straight up.
pub(crate) fn star(center: Point, outer: f64, inner: f64) -> BezPath {
    let pts: Vec<Point> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { outer } else { inner };
            let angle = -std::f64::consts::FRAC_PI_2 + f64::from(i) * std::f64::consts::PI / 5.0;
            center + Vec2::new(angle.cos(), angle.sin()) * r
        })
        .collect();
    polygon(&pts)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/draw.rs"]
mod tests;
