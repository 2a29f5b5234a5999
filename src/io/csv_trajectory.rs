use std::path::Path;

use anyhow::Context as _;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::trajectory::point::{Trajectory, TrajectoryPoint};

/// Column layout of a trajectory CSV.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvLayout {
    /// `Datetime,Latitude,Longitude,Altitude`; datetimes as RFC 3339 or `dd/mm/yy HH:MM:SS`.
    #[default]
    Standard,
    /// Flightradar24 export: `Timestamp,UTC,Callsign,Position,Altitude,Speed,Direction`, with
    /// `Position` holding `"lat,lon"`.
    Flightradar24,
}

#[derive(Deserialize)]
struct StandardRecord {
    #[serde(rename = "Datetime")]
    datetime: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Altitude")]
    altitude: f64,
}

#[derive(Deserialize)]
struct Fr24Record {
    #[serde(rename = "UTC")]
    utc: String,
    #[serde(rename = "Position")]
    position: String,
    #[serde(rename = "Altitude")]
    altitude: f64,
}

/// Inclusive time window applied while reading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| t >= s) && self.end.is_none_or(|e| t <= e)
    }
}

pub fn parse_timestamp(s: &str) -> SkytraceResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%d/%m/%y %H:%M:%S")
        .map(|t| t.and_utc())
        .map_err(|e| SkytraceError::invalid_trajectory(format!("bad timestamp '{s}': {e}")))
}

fn parse_position(s: &str) -> SkytraceResult<(f64, f64)> {
    let bad = || SkytraceError::invalid_trajectory(format!("bad position '{s}'"));
    let (lat, lon) = s.split_once(',').ok_or_else(bad)?;
    Ok((
        lat.trim().parse().map_err(|_| bad())?,
        lon.trim().parse().map_err(|_| bad())?,
    ))
}

/// Read and validate a trajectory, dropping rows outside `window`.
pub fn read_trajectory<R: std::io::Read>(
    reader: R,
    layout: CsvLayout,
    window: TimeWindow,
) -> SkytraceResult<Trajectory> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();
    match layout {
        CsvLayout::Standard => {
            for (row, rec) in rdr.deserialize::<StandardRecord>().enumerate() {
                let rec = rec.with_context(|| format!("trajectory CSV row {}", row + 1))?;
                points.push(TrajectoryPoint::new(
                    parse_timestamp(&rec.datetime)?,
                    rec.latitude,
                    rec.longitude,
                    rec.altitude,
                ));
            }
        }
        CsvLayout::Flightradar24 => {
            for (row, rec) in rdr.deserialize::<Fr24Record>().enumerate() {
                let rec = rec.with_context(|| format!("trajectory CSV row {}", row + 1))?;
                let (lat, lon) = parse_position(&rec.position)?;
                points.push(TrajectoryPoint::new(
                    parse_timestamp(&rec.utc)?,
                    lat,
                    lon,
                    rec.altitude,
                ));
            }
        }
    }
    let read = points.len();
    points.retain(|p| window.contains(p.timestamp));
    tracing::debug!(read, kept = points.len(), ?layout, "trajectory CSV parsed");
    Trajectory::new(points)
}

pub fn read_trajectory_path(
    path: &Path,
    layout: CsvLayout,
    window: TimeWindow,
) -> SkytraceResult<Trajectory> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open trajectory CSV '{}'", path.display()))?;
    read_trajectory(std::io::BufReader::new(f), layout, window)
}

#[cfg(test)]
#[path = "../../tests/unit/io/csv_trajectory.rs"]
mod tests;
