use super::*;
use chrono::{TimeDelta, TimeZone};

use crate::foundation::core::Rgba8Premul;
use crate::geo::geos::GeostationaryParams;
use crate::geo::projector::ProjectionDescriptor;
use crate::render::raster::Raster;
use crate::scene::catalog::MatchPolicy;
use crate::trajectory::sampler::{ExtrapolationPolicy, Provenance};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 7, 14, 9, 30, 0).unwrap() + TimeDelta::seconds(secs)
}

fn scene(id: &str, secs: i64) -> SatelliteScene {
    // 100 px per degree over lat/lon [-1, 2].
    SatelliteScene::new(
        id,
        at(secs),
        ProjectionDescriptor::Equirectangular {
            extent: GeoBounds::new(-1.0, 2.0, -1.0, 2.0).unwrap(),
        },
        Arc::new(RasterBuf::filled(300, 300, Rgba8Premul::opaque(10, 20, 30))),
    )
}

fn inputs(scenes: Vec<SatelliteScene>, max_gap: Option<TimeDelta>) -> RunInputs {
    RunInputs {
        trajectory: Trajectory::new(vec![
            TrajectoryPoint::new(at(0), 0.0, 0.0, 1000.0),
            TrajectoryPoint::new(at(10), 1.0, 1.0, 2000.0),
        ])
        .unwrap(),
        scenes: SceneIndex::new(scenes, MatchPolicy::Nearest, max_gap).unwrap(),
    }
}

fn grid(start: i64, end: i64, step: i64) -> TimeGrid {
    TimeGrid::new(at(start), at(end), TimeDelta::seconds(step)).unwrap()
}

fn frames(outcomes: Vec<TimestepOutcome>) -> Vec<Frame> {
    outcomes
        .into_iter()
        .filter_map(|o| match o {
            TimestepOutcome::Composited(f) => Some(f),
            TimestepOutcome::Failed(_) => None,
        })
        .collect()
}

#[test]
fn one_frame_per_grid_timestep() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let mut g =
        FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 5), StopSignal::new())
            .unwrap();
    let out: Vec<_> = g.by_ref().collect::<SkytraceResult<_>>().unwrap();
    let frames = frames(out);

    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|f| f.scene_id == "d"));
    assert_eq!(
        frames.iter().map(|f| f.index).collect::<Vec<_>>(),
        vec![FrameIndex(0), FrameIndex(1), FrameIndex(2)]
    );

    let mid = &frames[1];
    assert_eq!(mid.timestamp, at(5));
    assert_eq!(mid.current.provenance, Provenance::Interpolated);
    assert_eq!(mid.current.point.latitude_deg, 0.5);
    assert_eq!(mid.current.point.longitude_deg, 0.5);
    assert_eq!(mid.current.point.altitude, 1500.0);
    assert_eq!(frames[2].current.provenance, Provenance::Exact);

    let summary = g.summary();
    assert_eq!(summary.grid_len, 3);
    assert_eq!(summary.frames_emitted, 3);
    assert!(summary.skipped.is_empty());
    assert!(!summary.cancelled);
    assert_eq!(summary.scenes_used.iter().collect::<Vec<_>>(), vec!["d"]);
}

#[test]
fn base_scene_is_not_modified() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let before = inputs.scenes.scenes()[0].raster.to_buf();
    let g = FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 5), StopSignal::new())
        .unwrap();
    let frames = frames(g.collect::<SkytraceResult<_>>().unwrap());
    assert_ne!(frames[2].raster, before);
    assert_eq!(inputs.scenes.scenes()[0].raster.to_buf(), before);
}

#[test]
fn out_of_range_timesteps_are_skipped_under_strict_policy() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let cfg = RunConfig {
        extrapolation: ExtrapolationPolicy::Strict,
        ..RunConfig::default()
    };
    let mut g = FrameGenerator::new(&inputs, &cfg, grid(-5, 15, 5), StopSignal::new()).unwrap();
    let out: Vec<_> = g.by_ref().collect::<SkytraceResult<_>>().unwrap();
    assert_eq!(out.len(), 5);
    assert_eq!(frames(out).len(), 3);

    let skipped = &g.summary().skipped;
    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().all(|s| s.kind == SkipKind::OutOfRange));
    assert_eq!(skipped[0].index, FrameIndex(0));
    assert_eq!(skipped[1].timestamp, at(15));
}

#[test]
fn gaps_beyond_the_limit_skip_but_do_not_abort() {
    let inputs = inputs(vec![scene("d", 0)], Some(TimeDelta::seconds(2)));
    let mut g =
        FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 5), StopSignal::new())
            .unwrap();
    let out: Vec<_> = g.by_ref().collect::<SkytraceResult<_>>().unwrap();
    assert!(matches!(out[0], TimestepOutcome::Composited(_)));
    assert!(matches!(
        &out[1],
        TimestepOutcome::Failed(SkippedStep {
            kind: SkipKind::NoScene,
            ..
        })
    ));
    assert_eq!(g.summary().frames_emitted, 1);
    assert_eq!(g.summary().skipped.len(), 2);
}

#[test]
fn each_timestep_uses_its_nearest_scene() {
    let inputs = inputs(vec![scene("early", 0), scene("late", 9)], None);
    let g = FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 5), StopSignal::new())
        .unwrap();
    let ids: Vec<_> = frames(g.collect::<SkytraceResult<_>>().unwrap())
        .into_iter()
        .map(|f| f.scene_id)
        .collect();
    assert_eq!(ids, vec!["early", "late", "late"]);
}

#[test]
fn raised_stop_yields_nothing_further() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let stop = StopSignal::new();
    let mut g =
        FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 1), stop.clone()).unwrap();
    assert!(g.next().is_some());
    assert!(g.next().is_some());
    stop.stop();
    assert!(g.next().is_none());
    assert!(g.next().is_none());
    assert_eq!(g.summary().frames_emitted, 2);
    assert!(g.summary().cancelled);
}

#[test]
fn restart_replays_the_grid() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let mut g =
        FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 5), StopSignal::new())
            .unwrap();
    let first: Vec<_> = g.by_ref().collect::<SkytraceResult<_>>().unwrap();
    assert!(g.next().is_none());
    g.restart();
    let second: Vec<_> = g.by_ref().collect::<SkytraceResult<_>>().unwrap();
    assert_eq!(first, second);
    assert_eq!(g.summary().frames_emitted, 3);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let mut cfg = RunConfig::default();
    cfg.style.line_width_px = -1.0;
    assert!(FrameGenerator::new(&inputs, &cfg, grid(0, 10, 5), StopSignal::new()).is_err());
}

#[test]
fn track_crop_frames_the_whole_trajectory() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let cfg = RunConfig {
        crop: Some(CropMode::Track {
            lat_frac: 0.0,
            lon_frac: 0.0,
        }),
        ..RunConfig::default()
    };
    let g = FrameGenerator::new(&inputs, &cfg, grid(0, 10, 5), StopSignal::new()).unwrap();
    for f in frames(g.collect::<SkytraceResult<_>>().unwrap()) {
        // The 1x1 degree box spans about 100 pixels each way.
        assert!((100..=102).contains(&f.raster.width), "{}", f.raster.width);
        assert!((100..=102).contains(&f.raster.height), "{}", f.raster.height);
    }
}

#[test]
fn crop_outside_the_scene_keeps_the_full_frame() {
    let inputs = RunInputs {
        trajectory: Trajectory::new(vec![
            TrajectoryPoint::new(at(0), 40.0, 40.0, 1000.0),
            TrajectoryPoint::new(at(10), 41.0, 41.0, 2000.0),
        ])
        .unwrap(),
        scenes: SceneIndex::new(vec![scene("d", 0)], MatchPolicy::Nearest, None).unwrap(),
    };
    let cfg = RunConfig {
        crop: Some(CropMode::Around {
            lat_deg: 1.0,
            lon_deg: 1.0,
        }),
        ..RunConfig::default()
    };
    let g = FrameGenerator::new(&inputs, &cfg, grid(0, 0, 5), StopSignal::new()).unwrap();
    let frames = frames(g.collect::<SkytraceResult<_>>().unwrap());
    assert_eq!(frames.len(), 1);
    assert_eq!((frames[0].raster.width, frames[0].raster.height), (300, 300));
}

fn base_color() -> [u8; 4] {
    [10, 20, 30, 255]
}

fn single_scene_inputs(
    descriptor: ProjectionDescriptor,
    size: u32,
    from: (f64, f64),
    to: (f64, f64),
) -> RunInputs {
    let (w, h) = match descriptor {
        ProjectionDescriptor::Equirectangular { .. } => (size * 2, size),
        ProjectionDescriptor::Geostationary(_) => (size, size),
    };
    let scene = SatelliteScene::new(
        "only",
        at(0),
        descriptor,
        Arc::new(RasterBuf::filled(w, h, Rgba8Premul::opaque(10, 20, 30))),
    );
    RunInputs {
        trajectory: Trajectory::new(vec![
            TrajectoryPoint::new(at(0), from.0, from.1, 1000.0),
            TrajectoryPoint::new(at(10), to.0, to.1, 1000.0),
        ])
        .unwrap(),
        scenes: SceneIndex::new(vec![scene], MatchPolicy::Nearest, None).unwrap(),
    }
}

fn last_frame(inputs: &RunInputs, cfg: &RunConfig) -> Frame {
    let g = FrameGenerator::new(inputs, cfg, grid(10, 10, 1), StopSignal::new()).unwrap();
    frames(g.collect::<SkytraceResult<_>>().unwrap())
        .pop()
        .unwrap()
}

#[test]
fn antimeridian_trail_takes_the_short_way() {
    // One pixel per degree over the whole globe.
    let inputs = single_scene_inputs(
        ProjectionDescriptor::Equirectangular {
            extent: GeoBounds::new(-90.0, 90.0, -180.0, 180.0).unwrap(),
        },
        180,
        (0.0, 179.0),
        (0.0, -179.0),
    );
    let frame = last_frame(&inputs, &RunConfig::default());
    assert_eq!((frame.raster.width, frame.raster.height), (360, 180));

    assert_eq!(frame.raster.pixel(180, 90), base_color());
    for x in 12..348 {
        assert_eq!(frame.raster.pixel(x, 90), base_color(), "x={x}");
    }
    assert_ne!(frame.raster.pixel(359, 90), base_color());
    assert_ne!(frame.raster.pixel(0, 90), base_color());
}

#[test]
fn trail_reaches_the_disk_edge() {
    let inputs = single_scene_inputs(
        ProjectionDescriptor::Geostationary(GeostationaryParams::full_disk(0.0)),
        200,
        (0.0, 60.0),
        (0.0, 100.0),
    );
    let mut cfg = RunConfig::default();
    cfg.style.draw_start_end = false;
    let frame = last_frame(&inputs, &cfg);

    // 60E projects to about x = 193; the limb is at the right border.
    for x in 194..=198 {
        assert_ne!(frame.raster.pixel(x, 99), base_color(), "x={x}");
    }
}

#[test]
fn around_crop_keeps_one_even_size() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let cfg = RunConfig {
        crop: Some(CropMode::Around {
            lat_deg: 0.5,
            lon_deg: 0.5,
        }),
        ..RunConfig::default()
    };
    let g = FrameGenerator::new(&inputs, &cfg, grid(0, 10, 1), StopSignal::new()).unwrap();
    let sizes: BTreeSet<(u32, u32)> = frames(g.collect::<SkytraceResult<_>>().unwrap())
        .iter()
        .map(|f| (f.raster.width, f.raster.height))
        .collect();
    // A 1x1 degree window, about 100 pixels each way.
    assert_eq!(sizes.len(), 1);
    let (w, h) = sizes.into_iter().next().unwrap();
    assert_eq!((w % 2, h % 2), (0, 0));
    assert!((100..=102).contains(&w) && (100..=102).contains(&h), "{w}x{h}");
}

#[test]
fn around_crop_follows_the_aircraft() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let cfg = RunConfig {
        crop: Some(CropMode::Around {
            lat_deg: 0.5,
            lon_deg: 0.5,
        }),
        ..RunConfig::default()
    };
    let g = FrameGenerator::new(&inputs, &cfg, grid(0, 10, 5), StopSignal::new()).unwrap();
    let frames = frames(g.collect::<SkytraceResult<_>>().unwrap());
    // The current marker sits in the middle of each window.
    for f in &frames {
        assert_ne!(f.raster.pixel(50, 50), base_color(), "t={}", f.timestamp);
    }
    assert_ne!(frames[0].raster, frames[2].raster);
}

#[test]
fn track_crop_sizes_are_even_and_fixed() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let cfg = RunConfig {
        crop: Some(CropMode::Track {
            lat_frac: 0.005,
            lon_frac: 0.005,
        }),
        ..RunConfig::default()
    };
    let g = FrameGenerator::new(&inputs, &cfg, grid(0, 10, 1), StopSignal::new()).unwrap();
    let sizes: BTreeSet<(u32, u32)> = frames(g.collect::<SkytraceResult<_>>().unwrap())
        .iter()
        .map(|f| (f.raster.width, f.raster.height))
        .collect();
    assert_eq!(sizes.len(), 1);
    let (w, h) = sizes.into_iter().next().unwrap();
    assert_eq!((w % 2, h % 2), (0, 0));
}

#[test]
fn frames_the_sink_holds_are_not_rendered() {
    let inputs = inputs(vec![scene("d", 0)], None);
    let mut g =
        FrameGenerator::new(&inputs, &RunConfig::default(), grid(0, 10, 1), StopSignal::new())
            .unwrap();
    let mut rendered = Vec::new();
    while let Some(outcome) = g.next_wanted(|i| i.0 % 2 == 0) {
        if let TimestepOutcome::Composited(f) = outcome.unwrap() {
            rendered.push(f.index.0);
        }
    }
    assert_eq!(rendered, vec![0, 2, 4, 6, 8, 10]);
    assert_eq!(g.summary().already_present, 5);
    assert_eq!(g.summary().frames_emitted, 6);
}
