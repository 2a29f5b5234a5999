use std::cell::Cell;

use chrono::{DateTime, Utc};

use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::foundation::math::{delta_secs, lerp, lon_delta_deg, wrap_lon_deg};
use crate::trajectory::point::{Trajectory, TrajectoryPoint};

/// What to do with query times outside the recorded range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationPolicy {
    /// Hold the nearest endpoint.
    #[default]
    Clamp,
    /// Fail with [`SkytraceError::OutOfRange`].
    Strict,
    /// Extend the first/last recorded segment linearly.
    Linear,
}

/// How an [`InterpolatedPoint`] was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Exact,
    Interpolated,
    Extrapolated,
}

/// Position at a query instant. `point.timestamp` is always the query time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InterpolatedPoint {
    pub point: TrajectoryPoint,
    pub provenance: Provenance,
}

/// Samples a [`Trajectory`] at arbitrary instants.
///
/// Keeps the last bracketing index so that non-decreasing query sequences cost amortized O(1);
/// an earlier query falls back to binary search. The cursor is per instance, so the sampler is
/// `Send` but not `Sync`: parallel workers each clone their own.
#[derive(Clone, Debug)]
pub struct TrajectorySampler {
    trajectory: Trajectory,
    policy: ExtrapolationPolicy,
    cursor: Cell<usize>,
}

impl TrajectorySampler {
    pub fn new(trajectory: Trajectory, policy: ExtrapolationPolicy) -> Self {
        Self {
            trajectory,
            policy,
            cursor: Cell::new(0),
        }
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn policy(&self) -> ExtrapolationPolicy {
        self.policy
    }

    pub fn interpolate(&self, t: DateTime<Utc>) -> SkytraceResult<InterpolatedPoint> {
        let pts = self.trajectory.points();
        let first = self.trajectory.first();
        let last = self.trajectory.last();

        if t < first.timestamp || t > last.timestamp {
            return self.outside(t);
        }

        let i = self.bracket(t);
        let a = &pts[i];
        if a.timestamp == t {
            return Ok(InterpolatedPoint {
                point: *a,
                provenance: Provenance::Exact,
            });
        }

        // `t` is strictly inside the range and not on `pts[i]`, so `i + 1` exists.
        let b = &pts[i + 1];
        Ok(InterpolatedPoint {
            point: lerp_point(a, b, time_fraction(a, b, t), t),
            provenance: Provenance::Interpolated,
        })
    }

    /// Index `i` with `pts[i].timestamp <= t < pts[i + 1].timestamp` (or the last index).
    fn bracket(&self, t: DateTime<Utc>) -> usize {
        let pts = self.trajectory.points();
        let last_idx = pts.len() - 1;
        let mut i = self.cursor.get().min(last_idx);

        if pts[i].timestamp <= t {
            while i < last_idx && pts[i + 1].timestamp <= t {
                i += 1;
            }
        } else {
            i = pts.partition_point(|p| p.timestamp <= t).saturating_sub(1);
        }

        self.cursor.set(i);
        i
    }

    fn outside(&self, t: DateTime<Utc>) -> SkytraceResult<InterpolatedPoint> {
        let pts = self.trajectory.points();
        let first = self.trajectory.first();
        let last = self.trajectory.last();
        let before = t < first.timestamp;

        match self.policy {
            ExtrapolationPolicy::Strict => Err(SkytraceError::OutOfRange {
                requested: t,
                first: first.timestamp,
                last: last.timestamp,
            }),
            ExtrapolationPolicy::Clamp => {
                let edge = if before { first } else { last };
                Ok(InterpolatedPoint {
                    point: TrajectoryPoint {
                        timestamp: t,
                        ..*edge
                    },
                    provenance: Provenance::Extrapolated,
                })
            }
            ExtrapolationPolicy::Linear => {
                let (a, b) = if before {
                    (&pts[0], &pts[1])
                } else {
                    (&pts[pts.len() - 2], &pts[pts.len() - 1])
                };
                let mut point = lerp_point(a, b, time_fraction(a, b, t), t);
                point.latitude_deg = point.latitude_deg.clamp(-90.0, 90.0);
                Ok(InterpolatedPoint {
                    point,
                    provenance: Provenance::Extrapolated,
                })
            }
        }
    }
}

fn time_fraction(a: &TrajectoryPoint, b: &TrajectoryPoint, t: DateTime<Utc>) -> f64 {
    delta_secs(t - a.timestamp) / delta_secs(b.timestamp - a.timestamp)
}

fn lerp_point(a: &TrajectoryPoint, b: &TrajectoryPoint, frac: f64, t: DateTime<Utc>) -> TrajectoryPoint {
    TrajectoryPoint {
        timestamp: t,
        latitude_deg: lerp(a.latitude_deg, b.latitude_deg, frac),
        longitude_deg: wrap_lon_deg(
            a.longitude_deg + lon_delta_deg(a.longitude_deg, b.longitude_deg) * frac,
        ),
        altitude: lerp(a.altitude, b.altitude, frac),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/sampler.rs"]
mod tests;
