use kurbo::{Point, Rect};

/// Clip segment `a → b` to `rect` (Liang–Barsky).
///
/// Returns the visible part, or `None` when the segment misses the rectangle entirely.
pub fn clip_segment(a: Point, b: Point, rect: Rect) -> Option<(Point, Point)> {
    let d = b - a;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-d.x, a.x - rect.x0),
        (d.x, rect.x1 - a.x),
        (-d.y, a.y - rect.y0),
        (d.y, rect.y1 - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((a + d * t0, a + d * t1))
}

#[cfg(test)]
#[path = "../../tests/unit/render/clip.rs"]
mod tests;
