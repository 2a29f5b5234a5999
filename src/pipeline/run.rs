use chrono::{DateTime, Utc};
use rayon::prelude::*;

use crate::config::{RunConfig, Threading};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{SkytraceError, SkytraceResult};
use crate::pipeline::generator::{
    FrameGenerator, RunInputs, RunSummary, StopSignal, TimestepContext, TimestepOutcome,
};
use crate::pipeline::grid::TimeGrid;
use crate::trajectory::sampler::TrajectorySampler;

/// Render every timestep of `grid` and stream the frames into `sink` in grid order.
///
/// Skipped timesteps are recorded in the returned summary. Timesteps the sink already holds
/// (see [`FrameSink::wants`]) are not rendered. `sink.end()` is called on completion
/// and after cancellation, but not when the run aborts with an error.
#[tracing::instrument(skip_all, fields(grid_len = grid.len(), parallel = config.threading.parallel))]
pub fn render_run(
    inputs: &RunInputs,
    config: &RunConfig,
    grid: TimeGrid,
    sink: &mut dyn FrameSink,
    stop: &StopSignal,
) -> SkytraceResult<RunSummary> {
    tracing::info!(
        start = %grid.start(),
        end = %grid.end(),
        step = %grid.step(),
        scenes = inputs.scenes.len(),
        "run started"
    );
    sink.begin(SinkConfig {
        grid_len: grid.len(),
        step: grid.step(),
    })?;

    let summary = if config.threading.parallel {
        render_parallel(inputs, config, grid, sink, stop)?
    } else {
        render_sequential(inputs, config, grid, sink, stop)?
    };

    sink.end()?;
    tracing::info!(
        frames = summary.frames_emitted,
        skipped = summary.skipped.len(),
        cancelled = summary.cancelled,
        "run finished"
    );
    Ok(summary)
}

fn render_sequential(
    inputs: &RunInputs,
    config: &RunConfig,
    grid: TimeGrid,
    sink: &mut dyn FrameSink,
    stop: &StopSignal,
) -> SkytraceResult<RunSummary> {
    let mut generator = FrameGenerator::new(inputs, config, grid, stop.clone())?;
    loop {
        let next = generator.next_wanted(|index| sink.wants(index));
        let Some(outcome) = next else {
            break;
        };
        if let TimestepOutcome::Composited(frame) = outcome? {
            sink.push_frame(&frame)?;
        }
    }
    Ok(generator.into_summary())
}

fn render_parallel(
    inputs: &RunInputs,
    config: &RunConfig,
    grid: TimeGrid,
    sink: &mut dyn FrameSink,
    stop: &StopSignal,
) -> SkytraceResult<RunSummary> {
    let ctx = TimestepContext::new(inputs, config)?;
    let pool = build_thread_pool(&config.threading)?;
    let chunk_size = normalized_chunk_size(config.threading.chunk_size);

    let mut summary = RunSummary::new(grid.len());
    let mut chunk_start = 0u64;
    'chunks: while chunk_start < grid.len() {
        if stop.is_stopped() {
            summary.cancelled = true;
            break;
        }
        let chunk_end = (chunk_start + chunk_size).min(grid.len());
        let wanted: Vec<u64> = (chunk_start..chunk_end)
            .filter(|&i| sink.wants(FrameIndex(i)))
            .collect();
        summary.already_present += (chunk_end - chunk_start) - wanted.len() as u64;
        let steps = wanted
            .into_iter()
            .map(|i| {
                let index = FrameIndex(i);
                grid.at(index).map(|t| (index, t)).ok_or_else(|| {
                    SkytraceError::validation(format!("grid index {i} is not representable"))
                })
            })
            .collect::<SkytraceResult<Vec<(FrameIndex, DateTime<Utc>)>>>()?;

        let rendered = pool.install(|| {
            steps
                .par_iter()
                .map_init(
                    || TrajectorySampler::new(inputs.trajectory.clone(), config.extrapolation),
                    |worker_sampler, &(index, t)| {
                        if stop.is_stopped() {
                            return Ok(None);
                        }
                        ctx.run_timestep(worker_sampler, index, t).map(Some)
                    },
                )
                .collect::<Vec<_>>()
        });

        for outcome in rendered {
            if stop.is_stopped() {
                summary.cancelled = true;
                break 'chunks;
            }
            let Some(outcome) = outcome? else {
                continue;
            };
            summary.record(&outcome);
            if let TimestepOutcome::Composited(frame) = &outcome {
                sink.push_frame(frame)?;
            }
        }
        chunk_start = chunk_end;
    }
    if summary.cancelled {
        tracing::info!(emitted = summary.frames_emitted, "run cancelled");
    }
    Ok(summary)
}

/// Render the single timestep at `t`, picking its scene the same way a full run would.
pub fn render_frame_at(
    inputs: &RunInputs,
    config: &RunConfig,
    t: DateTime<Utc>,
) -> SkytraceResult<TimestepOutcome> {
    let ctx = TimestepContext::new(inputs, config)?;
    let sampler = TrajectorySampler::new(inputs.trajectory.clone(), config.extrapolation);
    ctx.run_timestep(&sampler, FrameIndex(0), t)
}

fn build_thread_pool(threading: &Threading) -> SkytraceResult<rayon::ThreadPool> {
    if threading.threads == Some(0) {
        return Err(SkytraceError::validation(
            "threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threading.threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| SkytraceError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/run.rs"]
mod tests;
