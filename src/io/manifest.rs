use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RunConfig;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::geo::projector::ProjectionDescriptor;
use crate::io::csv_trajectory::{CsvLayout, TimeWindow, read_trajectory_path};
use crate::io::scene::load_scene;
use crate::pipeline::generator::RunInputs;
use crate::scene::catalog::SceneIndex;
use crate::trajectory::point::{Trajectory, TrajectoryPoint};

/// Where the trajectory comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrajectoryInput {
    Csv {
        path: PathBuf,
        #[serde(default)]
        layout: CsvLayout,
        #[serde(default)]
        start: Option<DateTime<Utc>>,
        #[serde(default)]
        end: Option<DateTime<Utc>>,
    },
    Points { points: Vec<TrajectoryPoint> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub image: PathBuf,
    pub projection: ProjectionDescriptor,
}

/// JSON description of a complete run: trajectory, scenes and configuration.
///
/// Relative paths are resolved against the manifest's own directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub trajectory: TrajectoryInput,
    pub scenes: Vec<SceneEntry>,
    #[serde(default)]
    pub config: RunConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl RunManifest {
    pub fn new(trajectory: TrajectoryInput, scenes: Vec<SceneEntry>, config: RunConfig) -> Self {
        Self {
            trajectory,
            scenes,
            config,
            base_dir: PathBuf::new(),
        }
    }

    pub fn from_reader<R: std::io::Read>(r: R) -> SkytraceResult<Self> {
        let m: Self = serde_json::from_reader(r)
            .map_err(|e| SkytraceError::validation(format!("parse run manifest JSON: {e}")))?;
        m.config.validate()?;
        Ok(m)
    }

    pub fn from_path(path: impl AsRef<Path>) -> SkytraceResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SkytraceError::validation(format!("open run manifest '{}': {e}", path.display()))
        })?;
        let mut m = Self::from_reader(BufReader::new(f))?;
        m.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if let Some(label) = &mut m.config.label
            && label.font.is_relative()
        {
            label.font = m.base_dir.join(&label.font);
        }
        Ok(m)
    }

    /// Directory relative paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir.join(p)
        }
    }

    pub fn load_trajectory(&self) -> SkytraceResult<Trajectory> {
        match &self.trajectory {
            TrajectoryInput::Csv {
                path,
                layout,
                start,
                end,
            } => read_trajectory_path(
                &self.resolve(path),
                *layout,
                TimeWindow {
                    start: *start,
                    end: *end,
                },
            ),
            TrajectoryInput::Points { points } => Trajectory::new(points.clone()),
        }
    }

    pub fn load_scenes(&self) -> SkytraceResult<SceneIndex> {
        let scenes = self
            .scenes
            .iter()
            .map(|s| {
                load_scene(
                    &self.resolve(&s.image),
                    s.id.clone(),
                    s.timestamp,
                    s.projection.clone(),
                )
            })
            .collect::<SkytraceResult<Vec<_>>>()?;
        SceneIndex::new(
            scenes,
            self.config.match_policy,
            self.config.effective_max_gap()?,
        )
    }

    /// Decode every input the manifest names.
    pub fn load(&self) -> SkytraceResult<RunInputs> {
        let inputs = RunInputs {
            trajectory: self.load_trajectory()?,
            scenes: self.load_scenes()?,
        };
        tracing::info!(
            points = inputs.trajectory.len(),
            scenes = inputs.scenes.len(),
            "inputs loaded"
        );
        Ok(inputs)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/manifest.rs"]
mod tests;
