use super::*;

fn px(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}

#[test]
fn overlay_starts_transparent() {
    let data = Overlay::new(8, 4).unwrap().finish();
    assert_eq!(data.len(), 8 * 4 * 4);
    assert!(data.iter().all(|&b| b == 0));
}

#[test]
fn rejects_oversized_surfaces() {
    assert!(Overlay::new(70_000, 4).is_err());
}

#[test]
fn segment_covers_its_centerline() {
    let mut o = Overlay::new(32, 32).unwrap();
    o.segment(
        Point::new(4.0, 16.0),
        Point::new(28.0, 16.0),
        4.0,
        Rgba8Premul::opaque(255, 0, 0),
    );
    let data = o.finish();
    assert_eq!(px(&data, 32, 16, 15), [255, 0, 0, 255]);
    assert_eq!(px(&data, 32, 16, 5)[3], 0);
}

#[test]
fn markers_fill_their_center() {
    for shape in [MarkerShape::Star, MarkerShape::Circle, MarkerShape::Cross] {
        let mut o = Overlay::new(32, 32).unwrap();
        o.marker(Point::new(16.0, 16.0), shape, 8.0, Rgba8Premul::opaque(0, 0, 255));
        let data = o.finish();
        assert_eq!(px(&data, 32, 16, 16)[2], 255, "{shape:?}");
        assert_eq!(px(&data, 32, 0, 0)[3], 0, "{shape:?}");
    }
}

#[test]
fn star_has_ten_vertices_pointing_up() {
    let path = star(Point::new(0.0, 0.0), 10.0, 4.5);
    let verts: Vec<Point> = path
        .elements()
        .iter()
        .filter_map(|el| match el {
            PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(verts.len(), 10);
    assert!((verts[0].y - -10.0).abs() < 1e-9);
    assert!(verts[0].x.abs() < 1e-9);
}
