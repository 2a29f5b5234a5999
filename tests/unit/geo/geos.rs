use super::*;

fn himawari() -> GeostationaryProjection {
    GeostationaryProjection::new(&GeostationaryParams::full_disk(140.7))
}

#[test]
fn sub_satellite_point_maps_to_origin() {
    let xy = himawari().forward(GeoPoint::new(0.0, 140.7)).unwrap();
    assert!(xy.x.abs() < 1e-6 && xy.y.abs() < 1e-6, "{xy:?}");
}

#[test]
fn antipode_is_not_visible() {
    assert!(himawari().forward(GeoPoint::new(0.0, -39.3)).is_none());
    assert!(himawari().forward(GeoPoint::new(10.0, -30.0)).is_none());
}

#[test]
fn limb_lies_between_80_and_83_degrees() {
    let p = himawari();
    assert!(p.forward(GeoPoint::new(0.0, 140.7 + 80.0 - 360.0)).is_some());
    assert!(p.forward(GeoPoint::new(0.0, 140.7 - 80.0)).is_some());
    assert!(p.forward(GeoPoint::new(0.0, 140.7 - 83.0)).is_none());
    assert!(p.forward(GeoPoint::new(83.0, 140.7)).is_none());
}

#[test]
fn forward_inverse_round_trip() {
    for sweep in [Sweep::X, Sweep::Y] {
        let params = GeostationaryParams {
            sweep,
            ..GeostationaryParams::full_disk(-75.0)
        };
        let p = GeostationaryProjection::new(&params);
        for (lat, lon) in [(0.0, -75.0), (35.5, -100.25), (-42.0, -40.0), (60.0, -75.0)] {
            let xy = p.forward(GeoPoint::new(lat, lon)).unwrap();
            let back = p.inverse(xy).unwrap();
            assert!((back.lat_deg - lat).abs() < 1e-7, "{sweep:?} {lat} {lon} -> {back:?}");
            assert!((back.lon_deg - lon).abs() < 1e-7, "{sweep:?} {lat} {lon} -> {back:?}");
        }
    }
}

#[test]
fn projection_is_symmetric_about_the_sub_satellite_point() {
    let p = himawari();
    let ne = p.forward(GeoPoint::new(20.0, 150.7)).unwrap();
    let sw = p.forward(GeoPoint::new(-20.0, 130.7)).unwrap();
    assert!((ne.x + sw.x).abs() < 1e-6);
    assert!((ne.y + sw.y).abs() < 1e-6);
    assert!(ne.x > 0.0 && ne.y > 0.0);
}

#[test]
fn inverse_misses_off_disk() {
    let edge = GeostationaryParams::full_disk(0.0).extent.ur_x;
    assert!(himawari().inverse(Point::new(edge * 1.01, 0.0)).is_none());
    assert!(himawari().inverse(Point::new(edge * 0.99, 0.0)).is_some());
}

#[test]
fn disk_radius_and_validation() {
    let params = GeostationaryParams::full_disk(0.0);
    let r = params.disk_radius_rad();
    assert!((r.to_degrees() - 8.7).abs() < 0.05, "{}", r.to_degrees());
    assert!(params.validate().is_ok());

    let bad = GeostationaryParams {
        semi_minor_m: WGS84_SEMI_MAJOR_M * 2.0,
        ..params
    };
    assert!(bad.validate().is_err());
    let bad = GeostationaryParams {
        sub_lon_deg: 200.0,
        ..params
    };
    assert!(bad.validate().is_err());
}
