use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::pipeline::grid::TimeGrid;
use crate::render::label::TimeLabel;
use crate::render::track::TrackStyle;
use crate::scene::cadence::ScanCadence;
use crate::scene::catalog::MatchPolicy;
use crate::trajectory::point::{Trajectory, minute_floor};
use crate::trajectory::sampler::ExtrapolationPolicy;

/// Parse a human duration such as `"30s"`, `"2m 30s"` or `"1h"`.
pub fn parse_duration(s: &str) -> SkytraceResult<TimeDelta> {
    let d = humantime::parse_duration(s.trim())
        .map_err(|e| SkytraceError::validation(format!("invalid duration '{s}': {e}")))?;
    TimeDelta::from_std(d)
        .map_err(|e| SkytraceError::validation(format!("duration '{s}' out of range: {e}")))
}

fn format_duration(d: TimeDelta) -> String {
    match d.to_std() {
        Ok(d) => humantime::format_duration(d).to_string(),
        Err(_) => format!("{}s", d.num_seconds()),
    }
}

/// `TimeDelta` as a humantime string.
pub(crate) mod duration_str {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TimeDelta, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// `Option<TimeDelta>` as an optional humantime string.
pub(crate) mod opt_duration_str {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&super::format_duration(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeDelta>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|s| super::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Output grid. Missing bounds default to the trajectory's own span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    #[serde(with = "duration_str")]
    pub step: TimeDelta,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            step: TimeDelta::seconds(30),
        }
    }
}

/// Which points make up the drawn trail.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackSource {
    /// Recorded fixes as they are.
    #[default]
    Recorded,
    /// The trajectory re-sampled on a fixed cadence, which bridges gaps in receiver coverage.
    Resampled {
        #[serde(with = "duration_str")]
        step: TimeDelta,
    },
}

/// Optional crop applied to every composited frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CropMode {
    /// Bounding box of the whole trajectory, widened by a fraction of its span on each side.
    Track { lat_frac: f64, lon_frac: f64 },
    /// Fixed-size box centered on the current position.
    Around { lat_deg: f64, lon_deg: f64 },
}

impl CropMode {
    fn validate(&self) -> SkytraceResult<()> {
        let ok = match *self {
            Self::Track { lat_frac, lon_frac } => {
                lat_frac.is_finite() && lon_frac.is_finite() && lat_frac >= 0.0 && lon_frac >= 0.0
            }
            Self::Around { lat_deg, lon_deg } => {
                lat_deg.is_finite() && lon_deg.is_finite() && lat_deg > 0.0 && lon_deg > 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(SkytraceError::validation(format!("invalid crop {self:?}")))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Threading {
    pub parallel: bool,
    pub threads: Option<usize>,
    pub chunk_size: usize,
}

impl Default for Threading {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: None,
            chunk_size: 64,
        }
    }
}

/// Everything that shapes a run apart from its inputs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub grid: GridSpec,
    pub extrapolation: ExtrapolationPolicy,
    pub match_policy: MatchPolicy,
    /// Largest accepted distance between a timestep and its scene.
    #[serde(with = "opt_duration_str")]
    pub max_scene_gap: Option<TimeDelta>,
    /// Instrument cadence; its interval is the default `max_scene_gap`.
    pub cadence: Option<ScanCadence>,
    pub style: TrackStyle,
    pub track_source: TrackSource,
    pub crop: Option<CropMode>,
    /// Timestamp printed on each frame, after cropping.
    pub label: Option<TimeLabel>,
    pub threading: Threading,
}

impl RunConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> SkytraceResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| SkytraceError::validation(format!("parse run config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SkytraceResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SkytraceError::validation(format!("open run config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> SkytraceResult<()> {
        if self.grid.step <= TimeDelta::zero() {
            return Err(SkytraceError::validation("grid step must be > 0"));
        }
        if let (Some(start), Some(end)) = (self.grid.start, self.grid.end)
            && start > end
        {
            return Err(SkytraceError::validation(format!(
                "grid start {start} is after end {end}"
            )));
        }
        if let Some(gap) = self.max_scene_gap
            && gap < TimeDelta::zero()
        {
            return Err(SkytraceError::validation("max_scene_gap must be >= 0"));
        }
        if let Some(cadence) = &self.cadence {
            cadence.interval()?;
        }
        if let TrackSource::Resampled { step } = &self.track_source
            && *step <= TimeDelta::zero()
        {
            return Err(SkytraceError::validation("track resample step must be > 0"));
        }
        if let Some(crop) = &self.crop {
            crop.validate()?;
        }
        if let Some(label) = &self.label {
            label.validate()?;
        }
        if self.threading.threads == Some(0) {
            return Err(SkytraceError::validation(
                "threading 'threads' must be >= 1 when set",
            ));
        }
        self.style.validate()
    }

    /// Explicit gap, else the cadence interval, else unlimited.
    pub fn effective_max_gap(&self) -> SkytraceResult<Option<TimeDelta>> {
        match (self.max_scene_gap, &self.cadence) {
            (Some(gap), _) => Ok(Some(gap)),
            (None, Some(cadence)) => cadence.interval().map(Some),
            (None, None) => Ok(None),
        }
    }

    /// Grid for `trajectory`, filling missing bounds from its span.
    ///
    /// The default start is the first fix's minute boundary.
    pub fn grid_for(&self, trajectory: &Trajectory) -> SkytraceResult<TimeGrid> {
        let start = self
            .grid
            .start
            .unwrap_or_else(|| minute_floor(trajectory.start_time()));
        let end = self.grid.end.unwrap_or_else(|| trajectory.end_time());
        TimeGrid::new(start, end, self.grid.step)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
