use super::*;
use chrono::TimeZone;

const STANDARD: &str = "\
Datetime,Latitude,Longitude,Altitude
01/08/21 05:10:00,21.5,113.9,1200
01/08/21 05:10:30,21.6,114.0,2400
01/08/21 05:11:00,21.7,114.1,3600
";

#[test]
fn reads_the_standard_layout() {
    let traj =
        read_trajectory(STANDARD.as_bytes(), CsvLayout::Standard, TimeWindow::default()).unwrap();
    assert_eq!(traj.len(), 3);
    assert_eq!(
        traj.start_time(),
        Utc.with_ymd_and_hms(2021, 8, 1, 5, 10, 0).unwrap()
    );
    assert_eq!(traj.last().altitude, 3600.0);
}

#[test]
fn window_trims_both_ends() {
    let window = TimeWindow {
        start: Some(Utc.with_ymd_and_hms(2021, 8, 1, 5, 10, 30).unwrap()),
        end: Some(Utc.with_ymd_and_hms(2021, 8, 1, 5, 11, 0).unwrap()),
    };
    let traj = read_trajectory(STANDARD.as_bytes(), CsvLayout::Standard, window).unwrap();
    assert_eq!(traj.len(), 2);
    assert_eq!(traj.first().latitude_deg, 21.6);
}

#[test]
fn trimming_to_one_point_is_an_invalid_trajectory() {
    let window = TimeWindow {
        start: Some(Utc.with_ymd_and_hms(2021, 8, 1, 5, 11, 0).unwrap()),
        end: None,
    };
    let err = read_trajectory(STANDARD.as_bytes(), CsvLayout::Standard, window).unwrap_err();
    assert!(matches!(err, SkytraceError::InvalidTrajectory(_)));
}

#[test]
fn reads_flightradar24_exports() {
    let csv = "\
Timestamp,UTC,Callsign,Position,Altitude,Speed,Direction
1627794600,2021-08-01T05:10:00Z,CPA123,\"21.5,113.9\",1200,180,90
1627794630,2021-08-01T05:10:30Z,CPA123,\"21.6,114.0\",2400,190,91
";
    let traj =
        read_trajectory(csv.as_bytes(), CsvLayout::Flightradar24, TimeWindow::default()).unwrap();
    assert_eq!(traj.len(), 2);
    assert_eq!(traj.last().longitude_deg, 114.0);
    assert_eq!(traj.last().altitude, 2400.0);
}

#[test]
fn rfc3339_timestamps_are_accepted() {
    assert_eq!(
        parse_timestamp("2021-08-01T05:10:00+01:00").unwrap(),
        Utc.with_ymd_and_hms(2021, 8, 1, 4, 10, 0).unwrap()
    );
    assert!(parse_timestamp("yesterday").is_err());
}

#[test]
fn malformed_rows_report_context() {
    let csv = "Datetime,Latitude,Longitude,Altitude\n01/08/21 05:10:00,north,113.9,1200\n";
    let err = read_trajectory(csv.as_bytes(), CsvLayout::Standard, TimeWindow::default())
        .unwrap_err();
    assert!(err.to_string().contains("row 1"), "{err}");
}
