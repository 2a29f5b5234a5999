use super::*;
use chrono::TimeDelta;

use crate::scene::catalog::MatchPolicy;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "skytrace_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const MANIFEST: &str = r#"{
    "trajectory": {"path": "track.csv", "end": "2021-08-01T05:11:00Z"},
    "scenes": [
        {
            "timestamp": "2021-08-01T05:10:00Z",
            "image": "imgs/b0510.png",
            "projection": {
                "kind": "geostationary",
                "sub_lon_deg": 140.7,
                "extent": {"ll_x": -5434177.8, "ll_y": -5434177.8, "ur_x": 5434177.8, "ur_y": 5434177.8}
            }
        },
        {
            "id": "plate",
            "timestamp": "2021-08-01T05:20:00Z",
            "image": "imgs/plate.png",
            "projection": {
                "kind": "equirectangular",
                "extent": {"min_lat_deg": 20.0, "max_lat_deg": 23.0, "min_lon_deg": 112.0, "max_lon_deg": 116.0}
            }
        }
    ],
    "config": {
        "match_policy": "preceding",
        "cadence": {"sensor": "ahi", "mode": "full_disk"}
    }
}"#;

#[test]
fn loads_inputs_relative_to_the_manifest() {
    let dir = temp_dir("manifest_load");
    std::fs::create_dir_all(dir.join("imgs")).unwrap();
    std::fs::write(
        dir.join("track.csv"),
        "Datetime,Latitude,Longitude,Altitude\n\
         01/08/21 05:10:00,21.5,113.9,1200\n\
         01/08/21 05:10:30,21.6,114.0,2400\n\
         01/08/21 05:11:30,21.7,114.1,3600\n",
    )
    .unwrap();
    let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 40, 255]));
    img.save(dir.join("imgs/b0510.png")).unwrap();
    img.save(dir.join("imgs/plate.png")).unwrap();
    let path = dir.join("run.json");
    std::fs::write(&path, MANIFEST).unwrap();

    let manifest = RunManifest::from_path(&path).unwrap();
    assert_eq!(manifest.base_dir(), dir.as_path());
    assert_eq!(manifest.config.match_policy, MatchPolicy::Preceding);

    let inputs = manifest.load().unwrap();
    // The third row is after the end of the window.
    assert_eq!(inputs.trajectory.len(), 2);
    assert_eq!(inputs.scenes.len(), 2);
    assert_eq!(inputs.scenes.scenes()[0].id, "b0510");
    assert_eq!(inputs.scenes.scenes()[1].id, "plate");
    assert_eq!(inputs.scenes.max_gap(), Some(TimeDelta::minutes(10)));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn inline_points_need_no_files() {
    let json = r#"{
        "trajectory": {"points": [
            {"timestamp": "2021-08-01T05:10:00Z", "latitude_deg": 1.0, "longitude_deg": 2.0, "altitude": 0.0},
            {"timestamp": "2021-08-01T05:10:10Z", "latitude_deg": 1.5, "longitude_deg": 2.5, "altitude": 10.0}
        ]},
        "scenes": []
    }"#;
    let manifest = RunManifest::from_reader(json.as_bytes()).unwrap();
    assert_eq!(manifest.config, RunConfig::default());
    assert_eq!(manifest.load_trajectory().unwrap().len(), 2);
}

#[test]
fn invalid_config_fails_at_parse_time() {
    let json = r#"{
        "trajectory": {"path": "x.csv"},
        "scenes": [],
        "config": {"threading": {"threads": 0}}
    }"#;
    assert!(RunManifest::from_reader(json.as_bytes()).is_err());
}

#[test]
fn missing_scene_images_are_errors() {
    let manifest = RunManifest::new(
        TrajectoryInput::Points { points: Vec::new() },
        vec![SceneEntry {
            id: None,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            image: PathBuf::from("/nonexistent/scene.png"),
            projection: ProjectionDescriptor::Equirectangular {
                extent: crate::foundation::core::GeoBounds::new(-1.0, 1.0, -1.0, 1.0).unwrap(),
            },
        }],
        RunConfig::default(),
    );
    assert!(manifest.load_scenes().is_err());
}

#[test]
fn label_font_resolves_next_to_the_manifest() {
    let dir = temp_dir("manifest_label");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("run.json");
    std::fs::write(
        &path,
        r#"{
            "trajectory": {"path": "track.csv"},
            "scenes": [],
            "config": {"label": {"font": "fonts/mono.ttf", "size_px": 18}}
        }"#,
    )
    .unwrap();

    let manifest = RunManifest::from_path(&path).unwrap();
    let label = manifest.config.label.as_ref().unwrap();
    assert_eq!(label.font, dir.join("fonts/mono.ttf"));
    assert_eq!(label.size_px, 18.0);
    std::fs::remove_dir_all(&dir).ok();
}
