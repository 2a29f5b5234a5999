//! Skytrace renders the path of an aircraft (or any tracked object) over a sequence of
//! geostationary satellite scenes.
//!
//! For every timestep of an output grid it interpolates the trajectory, picks the scene closest in
//! time, projects the track into that scene's pixel grid and composites an altitude-colored trail
//! plus start, end and current-position markers over a copy of the scene:
//!
//! - Build a [`Trajectory`] and a [`SceneIndex`] (or load both from a [`RunManifest`])
//! - Iterate a [`FrameGenerator`] lazily, or stream a whole run into a [`FrameSink`] with
//!   [`render_run`]
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
/// Frame sinks.
pub mod encode;
pub mod geo;
pub mod io;
pub mod pipeline;
pub mod render;
pub mod scene;
pub mod trajectory;

pub use crate::foundation::core::{FrameIndex, GeoBounds, GeoPoint, Point, Rect, Rgba8Premul};
pub use crate::foundation::error::{SkytraceError, SkytraceResult};
pub use crate::foundation::math::{lon_delta_deg, wrap_lon_deg};

pub use crate::config::{CropMode, GridSpec, RunConfig, Threading, TrackSource, parse_duration};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::png::{PngSequenceSink, write_png};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::geo::geos::{GeostationaryParams, Sweep};
pub use crate::geo::projection::{AreaExtent, Projection};
pub use crate::geo::projector::{GeoProjector, ProjectedPoint, ProjectionDescriptor, SceneProjector};
pub use crate::io::csv_trajectory::{CsvLayout, TimeWindow};
pub use crate::io::manifest::{RunManifest, SceneEntry, TrajectoryInput};
pub use crate::pipeline::generator::{
    Frame, FrameGenerator, RunInputs, RunSummary, SkipKind, SkippedStep, StopSignal,
    TimestepOutcome,
};
pub use crate::pipeline::grid::TimeGrid;
pub use crate::pipeline::run::{render_frame_at, render_run};
pub use crate::render::color::{ColorScale, Palette, StyleColor};
pub use crate::render::draw::MarkerShape;
pub use crate::render::label::{LabelPainter, TimeLabel};
pub use crate::render::raster::{Raster, RasterBuf, SharedRaster};
pub use crate::render::track::{
    MarkerStyle, ProjectedTrack, TrackRenderer, TrackSegment, TrackStyle, TrackVertex,
};
pub use crate::scene::cadence::{ScanCadence, ScanMode, Sensor};
pub use crate::scene::catalog::{MatchPolicy, SatelliteScene, SceneIndex};
pub use crate::trajectory::point::{Trajectory, TrajectoryPoint};
pub use crate::trajectory::sampler::{
    ExtrapolationPolicy, InterpolatedPoint, Provenance, TrajectorySampler,
};
