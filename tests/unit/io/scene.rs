use super::*;
use crate::foundation::core::GeoBounds;
use crate::render::raster::Raster;

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "skytrace_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn decoded_images_are_premultiplied() {
    let dir = temp_dir("scene_decode");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("himawari_0510.png");
    let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 0]).unwrap();
    img.save(&path).unwrap();

    let scene = load_scene(
        &path,
        None,
        DateTime::<Utc>::UNIX_EPOCH,
        ProjectionDescriptor::Equirectangular {
            extent: GeoBounds::new(-1.0, 1.0, -1.0, 1.0).unwrap(),
        },
    )
    .unwrap();
    assert_eq!(scene.id, "himawari_0510");
    assert_eq!((scene.width(), scene.height()), (2, 1));
    assert_eq!(scene.raster.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(scene.raster.pixel(1, 0), [0, 0, 0, 0]);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_files_are_errors() {
    assert!(load_raster(Path::new("does/not/exist.png")).is_err());
}
