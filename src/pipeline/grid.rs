use chrono::{DateTime, TimeDelta, Utc};

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::trajectory::point::{Trajectory, minute_floor};

/// Output time grid: `start, start + step, …` up to and including `end` when it lands on the
/// grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeGrid {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeDelta,
}

impl TimeGrid {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: TimeDelta) -> SkytraceResult<Self> {
        if step <= TimeDelta::zero() {
            return Err(SkytraceError::validation("time grid step must be > 0"));
        }
        if start > end {
            return Err(SkytraceError::validation(format!(
                "time grid start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end, step })
    }

    /// Grid over the whole trajectory, starting on the first fix's minute boundary.
    pub fn covering(trajectory: &Trajectory, step: TimeDelta) -> SkytraceResult<Self> {
        Self::new(
            minute_floor(trajectory.start_time()),
            trajectory.end_time(),
            step,
        )
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn len(&self) -> u64 {
        let span = (self.end - self.start).num_nanoseconds();
        let step = self.step.num_nanoseconds();
        match (span, step) {
            (Some(span), Some(step)) => (span / step) as u64 + 1,
            // Spans beyond ~292 years do not fit in i64 nanoseconds.
            _ => ((self.end - self.start).num_milliseconds() / self.step.num_milliseconds().max(1))
                as u64
                + 1,
        }
    }

    /// Always `false`: a valid grid holds at least its start.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn at(&self, index: FrameIndex) -> Option<DateTime<Utc>> {
        if index.0 >= self.len() {
            return None;
        }
        let k = i32::try_from(index.0).ok()?;
        self.step
            .checked_mul(k)
            .and_then(|d| self.start.checked_add_signed(d))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameIndex, DateTime<Utc>)> + '_ {
        (0..self.len()).filter_map(|i| self.at(FrameIndex(i)).map(|t| (FrameIndex(i), t)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/grid.rs"]
mod tests;
