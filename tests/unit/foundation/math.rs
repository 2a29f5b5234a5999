use super::*;

#[test]
fn mul_div255_rounds() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(0, 200), 0);
    assert_eq!(mul_div255_u16(255, 1), 1);
}

#[test]
fn wrap_keeps_in_range_values() {
    assert_eq!(wrap_lon_deg(180.0), 180.0);
    assert_eq!(wrap_lon_deg(-180.0), -180.0);
    assert_eq!(wrap_lon_deg(12.5), 12.5);
    assert!((wrap_lon_deg(181.0) - -179.0).abs() < 1e-12);
    assert!((wrap_lon_deg(-190.0) - 170.0).abs() < 1e-12);
    assert!((wrap_lon_deg(540.0) - -180.0).abs() < 1e-12);
}

#[test]
fn lon_delta_takes_short_way() {
    assert!((lon_delta_deg(179.0, -179.0) - 2.0).abs() < 1e-12);
    assert!((lon_delta_deg(-179.0, 179.0) - -2.0).abs() < 1e-12);
    assert!((lon_delta_deg(10.0, 20.0) - 10.0).abs() < 1e-12);
    assert!((lon_delta_deg(0.0, 180.0) - 180.0).abs() < 1e-12);
}

#[test]
fn delta_secs_handles_subsecond() {
    let d = TimeDelta::milliseconds(2_500);
    assert!((delta_secs(d) - 2.5).abs() < 1e-12);
    assert!((delta_secs(TimeDelta::milliseconds(-500)) - -0.5).abs() < 1e-12);
}
