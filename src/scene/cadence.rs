use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::foundation::error::{SkytraceError, SkytraceResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    /// Himawari-8/9 Advanced Himawari Imager.
    Ahi,
    /// GOES-R Advanced Baseline Imager.
    Abi,
    /// Meteosat SEVIRI.
    Seviri,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    FullDisk,
    Meso,
    Conus,
    Pacus,
    M1,
    M2,
    /// SEVIRI rapid scan service.
    Rss,
}

/// Repeat cycle of an instrument in one scan mode.
///
/// Scans start on multiples of the interval within each hour, so the scan covering an instant
/// starts at the instant truncated to the interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScanCadence {
    pub sensor: Sensor,
    pub mode: ScanMode,
}

impl ScanCadence {
    pub fn new(sensor: Sensor, mode: ScanMode) -> SkytraceResult<Self> {
        let c = Self { sensor, mode };
        c.interval()?;
        Ok(c)
    }

    pub fn interval(&self) -> SkytraceResult<TimeDelta> {
        use ScanMode::*;
        use Sensor::*;

        match (self.sensor, self.mode) {
            (Ahi, FullDisk) | (Abi, FullDisk) | (Seviri, FullDisk) => Ok(TimeDelta::minutes(10)),
            (Ahi, Meso) => Ok(TimeDelta::seconds(150)),
            (Abi, Conus) | (Abi, Pacus) | (Seviri, Rss) => Ok(TimeDelta::minutes(5)),
            (Abi, M1) | (Abi, M2) => Ok(TimeDelta::minutes(1)),
            (sensor, mode) => Err(SkytraceError::validation(format!(
                "{sensor:?} has no {mode:?} scan mode"
            ))),
        }
    }

    /// Start of the scan in progress at `t`.
    pub fn scan_start(&self, t: DateTime<Utc>) -> SkytraceResult<DateTime<Utc>> {
        let step = self.interval()?;
        t.duration_trunc(step)
            .map_err(|e| SkytraceError::validation(format!("cannot align {t} to {step}: {e}")))
    }

    /// Scan starts covering `[start, end]`, beginning with the scan in progress at `start`.
    pub fn scan_starts(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SkytraceResult<Vec<DateTime<Utc>>> {
        let step = self.interval()?;
        let mut t = self.scan_start(start)?;
        let mut out = Vec::new();
        while t <= end {
            out.push(t);
            t += step;
        }
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/cadence.rs"]
mod tests;
