use chrono::{DateTime, Utc};

pub type SkytraceResult<T> = Result<T, SkytraceError>;

#[derive(thiserror::Error, Debug)]
pub enum SkytraceError {
    #[error("invalid trajectory: {0}")]
    InvalidTrajectory(String),

    #[error("query time {requested} is outside the trajectory range [{first}, {last}]")]
    OutOfRange {
        requested: DateTime<Utc>,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
    },

    #[error("no scene available for {requested}: {reason}")]
    NoSceneAvailable {
        requested: DateTime<Utc>,
        reason: String,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SkytraceError {
    pub fn invalid_trajectory(msg: impl Into<String>) -> Self {
        Self::InvalidTrajectory(msg.into())
    }

    pub fn no_scene(requested: DateTime<Utc>, reason: impl Into<String>) -> Self {
        Self::NoSceneAvailable {
            requested,
            reason: reason.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// `true` for failures that only invalidate a single output timestep.
    ///
    /// Everything else aborts the run.
    pub fn is_per_timestep(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::NoSceneAvailable { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
