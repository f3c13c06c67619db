//! Runs against the system libvlc. The ignored tests need libvlc and ffmpeg:
//! `cargo test -p framegrab-media --test libvlc_tests -- --ignored`

use framegrab_core::media::MediaSource;
use framegrab_media::binder::EngineBinder;
use framegrab_media::engine::EngineProvider;
use framegrab_media::thumbnail::{ThumbnailGenerator, generate_thumbnail};
use framegrab_test_harness::assertions::{assert_image_dimensions, assert_jpeg};
use framegrab_test_harness::fixtures::{fixture_dir, generate_test_video, real_engine_config};

#[test]
fn test_boundary_returns_none_for_missing_file() {
    // Without libvlc this is a binding failure, with it a session failure.
    // Either way the caller sees no bytes.
    assert!(generate_thumbnail("/nonexistent/framegrab/clip.mp4", 320, 240, 0.5).is_none());
}

#[test]
fn test_boundary_returns_none_for_i32_max_width() {
    let dir = fixture_dir();
    let video = dir.path().join("clip.mp4");
    std::fs::write(&video, b"").unwrap();
    let path = video.to_str().unwrap();

    assert!(generate_thumbnail(path, i32::MAX, 1, 0.5).is_none());
    assert!(generate_thumbnail(path, 1, i32::MAX, 0.5).is_none());
}

#[test]
#[ignore]
fn test_real_engine_thumbnail() {
    let dir = fixture_dir();
    let video = generate_test_video(dir.path(), "testsrc", 3.0);
    let config = real_engine_config();
    let generator = ThumbnailGenerator::new(EngineBinder::libvlc(&config), config);

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap();

    assert_jpeg(&thumb.data);
    assert_image_dimensions(&thumb.data, 320, 240);
    assert_eq!(thumb.seek.target_ms(), 1500);
}

#[test]
#[ignore]
fn test_real_engine_probe_and_version() {
    let dir = fixture_dir();
    let video = generate_test_video(dir.path(), "probe", 2.0);
    let config = real_engine_config();
    let binder = EngineBinder::libvlc(&config);

    let info = binder.engine().unwrap().info();
    assert!(info.version.is_some(), "unparsed version: {:?}", info.version_string);

    let generator = ThumbnailGenerator::new(binder, config);
    let media = generator.probe(&MediaSource::from(video.as_path())).unwrap();
    let duration = media.duration_ms.unwrap();
    assert!((1500..=2500).contains(&duration), "duration {duration}");
}

#[test]
#[ignore]
fn test_real_engine_boundary() {
    let dir = fixture_dir();
    let video = generate_test_video(dir.path(), "boundary", 2.0);

    let bytes = generate_thumbnail(video.to_str().unwrap(), 0, 0, 0.4).unwrap();
    assert_image_dimensions(&bytes, 320, 240);
}
