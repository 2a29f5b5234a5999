use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::foundation::core::{GeoBounds, GeoPoint};
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::trajectory::sampler::{ExtrapolationPolicy, TrajectorySampler};

/// One recorded fix of the tracked object.
///
/// `altitude` is carried in whatever unit the source uses (feet for ADS-B feeds); it only drives
/// the track color scale, which is configured in the same unit.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrajectoryPoint {
    pub timestamp: DateTime<Utc>,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude: f64,
}

impl TrajectoryPoint {
    pub fn new(timestamp: DateTime<Utc>, latitude_deg: f64, longitude_deg: f64, altitude: f64) -> Self {
        Self {
            timestamp,
            latitude_deg,
            longitude_deg,
            altitude,
        }
    }

    pub fn geo(&self) -> GeoPoint {
        GeoPoint::new(self.latitude_deg, self.longitude_deg)
    }

    pub(crate) fn same_position(&self, other: &Self) -> bool {
        self.latitude_deg == other.latitude_deg
            && self.longitude_deg == other.longitude_deg
            && self.altitude == other.altitude
    }
}

/// Validated, immutable recorded trajectory.
///
/// Points are strictly increasing in time and there are at least two of them. Cloning is cheap:
/// the points live behind an `Arc` and are shared between workers.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: Arc<[TrajectoryPoint]>,
}

impl Trajectory {
    pub fn new(points: Vec<TrajectoryPoint>) -> SkytraceResult<Self> {
        if points.len() < 2 {
            return Err(SkytraceError::invalid_trajectory(format!(
                "need at least 2 points to interpolate, got {}",
                points.len()
            )));
        }
        for (i, p) in points.iter().enumerate() {
            if !p.geo().is_valid() {
                return Err(SkytraceError::invalid_trajectory(format!(
                    "point {i} has invalid coordinates ({}, {})",
                    p.latitude_deg, p.longitude_deg
                )));
            }
            if !p.altitude.is_finite() {
                return Err(SkytraceError::invalid_trajectory(format!(
                    "point {i} has non-finite altitude"
                )));
            }
        }
        if let Some(i) = points
            .windows(2)
            .position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(SkytraceError::invalid_trajectory(format!(
                "timestamps must be strictly increasing: point {} ({}) is not after point {} ({})",
                i + 1,
                points[i + 1].timestamp,
                i,
                points[i].timestamp
            )));
        }
        Ok(Self {
            points: points.into(),
        })
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`: construction rejects short trajectories.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &TrajectoryPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &TrajectoryPoint {
        &self.points[self.points.len() - 1]
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.first().timestamp
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.last().timestamp
    }

    /// Recorded points at or before `t`.
    pub fn samples_until(&self, t: DateTime<Utc>) -> &[TrajectoryPoint] {
        let k = self.points.partition_point(|p| p.timestamp <= t);
        &self.points[..k]
    }

    pub fn bounds(&self) -> GeoBounds {
        self.points[1..]
            .iter()
            .fold(GeoBounds::of_point(self.first().geo()), |b, p| {
                b.including(p.geo())
            })
    }

    /// Re-sample onto a fixed cadence starting at the first point's minute boundary.
    ///
    /// Smooths over coverage gaps in the recorded feed. Leading samples that fall before the first
    /// fix are extended linearly from the first segment.
    pub fn resample(&self, step: TimeDelta) -> SkytraceResult<Trajectory> {
        if step <= TimeDelta::zero() {
            return Err(SkytraceError::validation("resample step must be > 0"));
        }
        let start = minute_floor(self.start_time());
        let end = self.end_time();
        let sampler = TrajectorySampler::new(self.clone(), ExtrapolationPolicy::Linear);

        let mut out = Vec::new();
        let mut t = start;
        while t <= end {
            out.push(sampler.interpolate(t)?.point);
            t += step;
        }
        if out.len() < 2 {
            return Err(SkytraceError::validation(format!(
                "resample step {step} leaves fewer than 2 samples over the trajectory"
            )));
        }
        Trajectory::new(out)
    }
}

pub(crate) fn minute_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

#[cfg(test)]
#[path = "../../tests/unit/trajectory/point.rs"]
mod tests;
