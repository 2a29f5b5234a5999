use super::*;
use chrono::TimeZone;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

fn p(secs: i64, lat: f64, lon: f64, alt: f64) -> TrajectoryPoint {
    TrajectoryPoint::new(at(secs), lat, lon, alt)
}

#[test]
fn rejects_short_trajectories() {
    let err = Trajectory::new(vec![p(0, 0.0, 0.0, 0.0)]).unwrap_err();
    assert!(matches!(err, SkytraceError::InvalidTrajectory(_)));
    assert!(Trajectory::new(Vec::new()).is_err());
}

#[test]
fn rejects_duplicate_and_decreasing_timestamps() {
    let dup = Trajectory::new(vec![p(0, 0.0, 0.0, 0.0), p(0, 1.0, 1.0, 0.0)]);
    assert!(matches!(dup, Err(SkytraceError::InvalidTrajectory(_))));

    let back = Trajectory::new(vec![
        p(0, 0.0, 0.0, 0.0),
        p(10, 1.0, 1.0, 0.0),
        p(5, 2.0, 2.0, 0.0),
    ]);
    let msg = back.unwrap_err().to_string();
    assert!(msg.contains("point 2"), "{msg}");
}

#[test]
fn rejects_invalid_coordinates() {
    assert!(Trajectory::new(vec![p(0, 95.0, 0.0, 0.0), p(1, 0.0, 0.0, 0.0)]).is_err());
    assert!(Trajectory::new(vec![p(0, 0.0, 0.0, f64::NAN), p(1, 0.0, 0.0, 0.0)]).is_err());
}

#[test]
fn samples_until_is_inclusive() {
    let traj = Trajectory::new(vec![
        p(0, 0.0, 0.0, 0.0),
        p(10, 1.0, 1.0, 0.0),
        p(20, 2.0, 2.0, 0.0),
    ])
    .unwrap();
    assert_eq!(traj.samples_until(at(-1)).len(), 0);
    assert_eq!(traj.samples_until(at(0)).len(), 1);
    assert_eq!(traj.samples_until(at(15)).len(), 2);
    assert_eq!(traj.samples_until(at(20)).len(), 3);
    assert_eq!(traj.start_time(), at(0));
    assert_eq!(traj.end_time(), at(20));
}

#[test]
fn bounds_cover_all_points() {
    let traj = Trajectory::new(vec![
        p(0, 10.0, 100.0, 0.0),
        p(10, 12.5, 98.0, 0.0),
        p(20, 11.0, 104.0, 0.0),
    ])
    .unwrap();
    let b = traj.bounds();
    assert_eq!(b.min_lat_deg, 10.0);
    assert_eq!(b.max_lat_deg, 12.5);
    assert_eq!(b.min_lon_deg, 98.0);
    assert_eq!(b.max_lon_deg, 104.0);
}

#[test]
fn resample_starts_on_minute_boundary() {
    let t0 = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 20).unwrap();
    let traj = Trajectory::new(vec![
        TrajectoryPoint::new(t0, 0.0, 0.0, 1000.0),
        TrajectoryPoint::new(t0 + TimeDelta::seconds(100), 1.0, 1.0, 2000.0),
    ])
    .unwrap();

    let r = traj.resample(TimeDelta::seconds(30)).unwrap();
    let first = r.first();
    assert_eq!(first.timestamp, Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap());
    // 20 s before the first fix on a 100 s / 1 degree segment.
    assert!((first.latitude_deg - -0.2).abs() < 1e-9);
    assert!((first.altitude - 800.0).abs() < 1e-6);
    // 12:00:00, 12:00:30, 12:01:00, 12:01:30 and 12:02:00, which is the last fix itself.
    assert_eq!(r.len(), 5);
    assert_eq!(r.last().timestamp, t0 + TimeDelta::seconds(100));
}

#[test]
fn resample_rejects_bad_step() {
    let traj = Trajectory::new(vec![p(0, 0.0, 0.0, 0.0), p(10, 1.0, 1.0, 0.0)]).unwrap();
    assert!(traj.resample(TimeDelta::zero()).is_err());
    assert!(traj.resample(TimeDelta::seconds(-5)).is_err());
}
