use chrono::TimeDelta;

use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::pipeline::generator::Frame;

/// Configuration provided to a [`FrameSink`] at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Number of timesteps on the grid. Skipped or cancelled timesteps never arrive, so this is
    /// an upper bound on the frames pushed.
    pub grid_len: u64,
    /// Simulated time between consecutive grid timesteps.
    pub step: TimeDelta,
}

/// Consumer of composited frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing [`FrameIndex`] order, at most
/// once per index.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> SkytraceResult<()>;
    fn push_frame(&mut self, frame: &Frame) -> SkytraceResult<()>;
    /// `false` when the sink already holds the frame for `index`; that timestep is then not
    /// rendered at all.
    fn wants(&self, _index: FrameIndex) -> bool {
        true
    }
    /// Called once after the last frame, including after a cancelled run.
    fn end(&mut self) -> SkytraceResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<Frame>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SkytraceResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> SkytraceResult<()> {
        check_order(self.frames.last().map(|f| f.index), frame.index)?;
        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> SkytraceResult<()> {
        self.ended = true;
        Ok(())
    }
}

pub(crate) fn check_order(last: Option<FrameIndex>, idx: FrameIndex) -> SkytraceResult<()> {
    match last {
        Some(last) if idx <= last => Err(SkytraceError::encode(format!(
            "sink received frame {} after frame {}",
            idx.0, last.0
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
