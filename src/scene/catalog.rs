use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::geo::projector::ProjectionDescriptor;
use crate::render::raster::SharedRaster;

/// One satellite image and the geometry it was acquired under.
#[derive(Clone)]
pub struct SatelliteScene {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub projection: ProjectionDescriptor,
    pub raster: SharedRaster,
}

impl SatelliteScene {
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        projection: ProjectionDescriptor,
        raster: SharedRaster,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            projection,
            raster,
        }
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

impl fmt::Debug for SatelliteScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SatelliteScene")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .field("projection", &self.projection)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

/// How a query instant is paired with a scene.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Smallest absolute time difference; ties go to the earlier scene.
    #[default]
    Nearest,
    /// Latest scene acquired at or before the query instant.
    Preceding,
}

/// Immutable, time-sorted scene catalog.
#[derive(Clone, Debug)]
pub struct SceneIndex {
    scenes: Vec<SatelliteScene>,
    policy: MatchPolicy,
    max_gap: Option<TimeDelta>,
}

impl SceneIndex {
    /// Sorts the scenes by timestamp and validates their descriptors.
    ///
    /// Two scenes with the same timestamp are rejected: the match would be ambiguous.
    pub fn new(
        mut scenes: Vec<SatelliteScene>,
        policy: MatchPolicy,
        max_gap: Option<TimeDelta>,
    ) -> SkytraceResult<Self> {
        if let Some(gap) = max_gap
            && gap < TimeDelta::zero()
        {
            return Err(SkytraceError::validation("max scene gap must be >= 0"));
        }
        scenes.sort_by_key(|s| s.timestamp);
        if let Some(w) = scenes.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(SkytraceError::validation(format!(
                "scenes '{}' and '{}' share timestamp {}",
                w[0].id, w[1].id, w[0].timestamp
            )));
        }
        for s in &scenes {
            s.projection.validate().map_err(|e| {
                SkytraceError::validation(format!("scene '{}': {e}", s.id))
            })?;
            if s.width() == 0 || s.height() == 0 {
                return Err(SkytraceError::validation(format!(
                    "scene '{}' has an empty raster",
                    s.id
                )));
            }
        }
        Ok(Self {
            scenes,
            policy,
            max_gap,
        })
    }

    pub fn scenes(&self) -> &[SatelliteScene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn max_gap(&self) -> Option<TimeDelta> {
        self.max_gap
    }

    /// Scene for instant `t` under the index's match policy.
    pub fn resolve(&self, t: DateTime<Utc>) -> SkytraceResult<&SatelliteScene> {
        if self.scenes.is_empty() {
            return Err(SkytraceError::no_scene(t, "scene catalog is empty"));
        }

        // First scene strictly after `t`.
        let after = self.scenes.partition_point(|s| s.timestamp <= t);
        let preceding = after.checked_sub(1).map(|i| &self.scenes[i]);

        let scene = match self.policy {
            MatchPolicy::Preceding => preceding.ok_or_else(|| {
                SkytraceError::no_scene(
                    t,
                    format!("no scene at or before (first is {})", self.scenes[0].timestamp),
                )
            })?,
            MatchPolicy::Nearest => match (preceding, self.scenes.get(after)) {
                (Some(p), Some(n)) => {
                    if n.timestamp - t < t - p.timestamp {
                        n
                    } else {
                        p
                    }
                }
                (Some(p), None) => p,
                (None, Some(n)) => n,
                (None, None) => {
                    return Err(SkytraceError::no_scene(t, "scene catalog is empty"));
                }
            },
        };

        let gap = (scene.timestamp - t).abs();
        if let Some(max) = self.max_gap
            && gap > max
        {
            return Err(SkytraceError::no_scene(
                t,
                format!(
                    "nearest scene '{}' is {} away (max {})",
                    scene.id,
                    humantime::format_duration(gap.to_std().unwrap_or_default()),
                    humantime::format_duration(max.to_std().unwrap_or_default()),
                ),
            ));
        }
        Ok(scene)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/catalog.rs"]
mod tests;
