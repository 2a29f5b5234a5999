use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::config::{CropMode, RunConfig, TrackSource};
use crate::foundation::core::{FrameIndex, GeoBounds};
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::geo::projector::{ProjectedPoint, SceneProjector};
use crate::pipeline::grid::TimeGrid;
use crate::render::label::LabelPainter;
use crate::render::raster::RasterBuf;
use crate::render::track::{ProjectedTrack, TrackRenderer, TrackSegment, TrackVertex};
use crate::scene::catalog::{SatelliteScene, SceneIndex};
use crate::trajectory::point::{Trajectory, TrajectoryPoint};
use crate::trajectory::sampler::{InterpolatedPoint, TrajectorySampler};

/// The immutable inputs of a run.
#[derive(Clone, Debug)]
pub struct RunInputs {
    pub trajectory: Trajectory,
    pub scenes: SceneIndex,
}

/// Cooperative cancellation flag shared between a run and its controller.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One composited output image.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub index: FrameIndex,
    pub timestamp: DateTime<Utc>,
    pub raster: RasterBuf,
    pub scene_id: String,
    pub current: InterpolatedPoint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    OutOfRange,
    NoScene,
}

/// A timestep that produced no frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkippedStep {
    pub index: FrameIndex,
    pub timestamp: DateTime<Utc>,
    pub kind: SkipKind,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TimestepOutcome {
    Composited(Frame),
    Failed(SkippedStep),
}

/// Aggregate result of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunSummary {
    pub grid_len: u64,
    pub frames_emitted: u64,
    pub skipped: Vec<SkippedStep>,
    pub cancelled: bool,
    /// Timesteps not rendered because the sink already held their frame.
    pub already_present: u64,
    pub scenes_used: BTreeSet<String>,
}

impl RunSummary {
    pub(crate) fn new(grid_len: u64) -> Self {
        Self {
            grid_len,
            ..Self::default()
        }
    }

    pub(crate) fn record(&mut self, outcome: &TimestepOutcome) {
        match outcome {
            TimestepOutcome::Composited(frame) => {
                self.frames_emitted += 1;
                self.scenes_used.insert(frame.scene_id.clone());
            }
            TimestepOutcome::Failed(step) => self.skipped.push(step.clone()),
        }
    }
}

enum TimestepState<'a> {
    Pending(DateTime<Utc>),
    Resolved {
        point: InterpolatedPoint,
        scene: &'a SatelliteScene,
    },
    Composited(Frame),
    Failed(SkippedStep),
}

/// Read-only per-run state shared by every timestep, and by every worker in parallel runs.
pub(crate) struct TimestepContext<'a> {
    inputs: &'a RunInputs,
    track: Trajectory,
    renderer: TrackRenderer,
    crop: Option<CropMode>,
    label: Option<LabelPainter>,
}

impl<'a> TimestepContext<'a> {
    pub(crate) fn new(inputs: &'a RunInputs, config: &RunConfig) -> SkytraceResult<Self> {
        config.validate()?;
        let track = match &config.track_source {
            TrackSource::Recorded => inputs.trajectory.clone(),
            TrackSource::Resampled { step } => inputs.trajectory.resample(*step)?,
        };
        Ok(Self {
            inputs,
            track,
            renderer: TrackRenderer::new(config.style.clone())?,
            crop: config.crop,
            label: config.label.as_ref().map(LabelPainter::load).transpose()?,
        })
    }

    /// Drive one timestep to a terminal state.
    ///
    /// Per-timestep failures come back as [`TimestepOutcome::Failed`]; anything else is an error
    /// that should abort the run.
    pub(crate) fn run_timestep(
        &self,
        sampler: &TrajectorySampler,
        index: FrameIndex,
        t: DateTime<Utc>,
    ) -> SkytraceResult<TimestepOutcome> {
        let mut state = TimestepState::Pending(t);
        loop {
            state = match state {
                TimestepState::Pending(t) => self.resolve(sampler, index, t)?,
                TimestepState::Resolved { point, scene } => {
                    TimestepState::Composited(self.composite(index, point, scene)?)
                }
                TimestepState::Composited(frame) => {
                    tracing::debug!(index = index.0, %t, scene = %frame.scene_id, "composited");
                    return Ok(TimestepOutcome::Composited(frame));
                }
                TimestepState::Failed(step) => {
                    tracing::warn!(index = index.0, %t, reason = %step.reason, "timestep skipped");
                    return Ok(TimestepOutcome::Failed(step));
                }
            };
        }
    }

    fn resolve(
        &self,
        sampler: &TrajectorySampler,
        index: FrameIndex,
        t: DateTime<Utc>,
    ) -> SkytraceResult<TimestepState<'a>> {
        let resolved = sampler
            .interpolate(t)
            .and_then(|point| Ok((point, self.inputs.scenes.resolve(t)?)));
        match resolved {
            Ok((point, scene)) => Ok(TimestepState::Resolved { point, scene }),
            Err(e) => {
                let kind = match e {
                    SkytraceError::OutOfRange { .. } => SkipKind::OutOfRange,
                    SkytraceError::NoSceneAvailable { .. } => SkipKind::NoScene,
                    _ => return Err(e),
                };
                Ok(TimestepState::Failed(SkippedStep {
                    index,
                    timestamp: t,
                    kind,
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn composite(
        &self,
        index: FrameIndex,
        current: InterpolatedPoint,
        scene: &SatelliteScene,
    ) -> SkytraceResult<Frame> {
        let projector = SceneProjector::for_scene(scene);
        let t = current.point.timestamp;

        let mut path: Vec<TrajectoryPoint> = self.track.samples_until(t).to_vec();
        if path.last().is_none_or(|last| !last.same_position(&current.point)) {
            path.push(current.point);
        }
        let mut segments = Vec::with_capacity(path.len());
        for w in path.windows(2) {
            self.push_segments(&projector, &w[0], &w[1], &mut segments);
        }

        let recorded = &self.inputs.trajectory;
        let track = ProjectedTrack {
            segments,
            start: Some(projector.project(recorded.first().geo())),
            end: Some(projector.project(recorded.last().geo())),
        };
        let here = projector.project(current.point.geo());
        let raster = self
            .renderer
            .render(scene.raster.as_ref(), &track, &here)?;
        let mut raster = match self.crop {
            Some(mode) => self.crop_to(&projector, raster, mode, &here),
            None => raster,
        };
        if let Some(label) = &self.label {
            label.paint(&mut raster, t)?;
        }

        Ok(Frame {
            index,
            timestamp: t,
            raster,
            scene_id: scene.id.clone(),
            current,
        })
    }

    /// Segments drawn between two samples.
    ///
    /// A path crossing a lat/lon grid's seam becomes two segments, one ending at each edge. An
    /// endpoint beyond the limb is moved onto the limb so the visible part is still drawn.
    fn push_segments(
        &self,
        projector: &SceneProjector,
        a: &TrajectoryPoint,
        b: &TrajectoryPoint,
        out: &mut Vec<TrackSegment>,
    ) {
        let segment = |pa: ProjectedPoint, pb: ProjectedPoint| {
            TrackSegment::between(
                &TrackVertex {
                    projected: pa,
                    altitude: a.altitude,
                },
                &TrackVertex {
                    projected: pb,
                    altitude: b.altitude,
                },
            )
        };

        if let Some(pieces) = projector.seam_split(a.geo(), b.geo()) {
            out.extend(pieces.into_iter().map(|(pa, pb)| segment(pa, pb)));
            return;
        }

        let mut pa = projector.project(a.geo());
        let mut pb = projector.project(b.geo());
        if pa.has_position() && !pb.has_position() {
            pb = projector
                .limb_crossing(a.geo(), b.geo())
                .unwrap_or(pb);
        } else if pb.has_position() && !pa.has_position() {
            pa = projector
                .limb_crossing(b.geo(), a.geo())
                .unwrap_or(pa);
        }
        out.push(segment(pa, pb));
    }

    /// Crop to the configured window.
    ///
    /// The window size depends only on the scene, so every frame on a scene has the same even
    /// width and height. `Around` windows follow the current position and are clamped inside the
    /// raster.
    fn crop_to(
        &self,
        projector: &SceneProjector,
        raster: RasterBuf,
        mode: CropMode,
        current: &ProjectedPoint,
    ) -> RasterBuf {
        let recorded = self.inputs.trajectory.bounds();
        let (bounds, follow) = match mode {
            CropMode::Track { lat_frac, lon_frac } => (recorded.buffered(lat_frac, lon_frac), None),
            CropMode::Around { lat_deg, lon_deg } => (
                GeoBounds::around(recorded.center(), lat_deg, lon_deg),
                current.has_position().then(|| current.point()),
            ),
        };
        let raster_rect = projector.raster_rect();
        let Some(rect) = projector.pixel_bounds(&bounds) else {
            tracing::debug!(?bounds, "crop box is beyond the limb, keeping the full frame");
            return raster;
        };
        let on_raster = rect.intersect(raster_rect);
        if on_raster.area() <= 0.0 {
            tracing::debug!(?bounds, "crop box misses the raster, keeping the full frame");
            return raster;
        }

        let (w, h, center) = match follow {
            // A fixed-size window around the aircraft.
            Some(px) => (
                even_extent(rect.width(), raster.width),
                even_extent(rect.height(), raster.height),
                px,
            ),
            None => (
                even_extent(on_raster.width(), raster.width),
                even_extent(on_raster.height(), raster.height),
                on_raster.center(),
            ),
        };
        let x0 = window_start(center.x, w, raster.width);
        let y0 = window_start(center.y, h, raster.height);
        match raster.crop(x0, y0, x0 + w, y0 + h) {
            Some(cropped) => cropped,
            None => raster,
        }
    }
}

/// `len` pixels rounded up to an even count, capped at the largest even count within `limit`.
fn even_extent(len: f64, limit: u32) -> u32 {
    let limit = limit - limit % 2;
    let n = len.ceil().max(2.0).min(f64::from(limit)) as u32;
    n + n % 2
}

/// First pixel of a `len`-wide window centered on `center`, kept inside `0..limit`.
fn window_start(center: f64, len: u32, limit: u32) -> u32 {
    let max = f64::from(limit.saturating_sub(len));
    (center - f64::from(len) * 0.5).round().clamp(0.0, max) as u32
}

/// Lazily renders one grid timestep per `next()`.
///
/// Yields `Ok(outcome)` for composited and skipped timesteps alike, and a single `Err` for a
/// failure that aborts the run, after which it is exhausted. Once the [`StopSignal`] is raised,
/// nothing further is yielded and a frame composited concurrently with the stop is discarded.
pub struct FrameGenerator<'a> {
    ctx: TimestepContext<'a>,
    sampler: TrajectorySampler,
    grid: TimeGrid,
    stop: StopSignal,
    next: u64,
    done: bool,
    summary: RunSummary,
}

impl<'a> FrameGenerator<'a> {
    pub fn new(
        inputs: &'a RunInputs,
        config: &RunConfig,
        grid: TimeGrid,
        stop: StopSignal,
    ) -> SkytraceResult<Self> {
        Ok(Self {
            ctx: TimestepContext::new(inputs, config)?,
            sampler: TrajectorySampler::new(inputs.trajectory.clone(), config.extrapolation),
            summary: RunSummary::new(grid.len()),
            grid,
            stop,
            next: 0,
            done: false,
        })
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Rewind to the first timestep and clear the summary. The stop signal is left as is.
    pub fn restart(&mut self) {
        self.next = 0;
        self.done = false;
        self.summary = RunSummary::new(self.grid.len());
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    fn cancel(&mut self) {
        if !self.done {
            tracing::info!(at = self.next, "run cancelled");
        }
        self.summary.cancelled = true;
        self.done = true;
    }

    /// Like [`Iterator::next`], but steps past timesteps for which `wants` is `false` without
    /// rendering them. They are counted in [`RunSummary::already_present`].
    pub fn next_wanted(
        &mut self,
        mut wants: impl FnMut(FrameIndex) -> bool,
    ) -> Option<SkytraceResult<TimestepOutcome>> {
        loop {
            if self.done {
                return None;
            }
            if self.stop.is_stopped() {
                self.cancel();
                return None;
            }
            let index = FrameIndex(self.next);
            let Some(t) = self.grid.at(index) else {
                self.done = true;
                return None;
            };
            self.next += 1;
            if !wants(index) {
                self.summary.already_present += 1;
                continue;
            }

            return match self.ctx.run_timestep(&self.sampler, index, t) {
                Ok(outcome) => {
                    if self.stop.is_stopped() {
                        self.cancel();
                        return None;
                    }
                    self.summary.record(&outcome);
                    Some(Ok(outcome))
                }
                Err(e) => {
                    self.done = true;
                    Some(Err(e))
                }
            };
        }
    }
}

impl Iterator for FrameGenerator<'_> {
    type Item = SkytraceResult<TimestepOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_wanted(|_| true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/generator.rs"]
mod tests;
