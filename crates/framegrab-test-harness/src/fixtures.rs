use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use framegrab_core::config::ThumbnailConfig;
use framegrab_core::timing::PollPolicy;
use framegrab_media::thumbnail::ThumbnailGenerator;

use crate::sleeper::RecordingSleeper;
use crate::stub_engine::{StubEngine, StubScript};

/// Get a temporary directory for test fixtures that persists for the test run.
pub fn fixture_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("failed to create temp dir for fixtures")
}

/// Write a placeholder media file. The stub engine never reads its contents,
/// but sessions require local paths to exist.
pub fn touch_media(output_dir: &Path, name: &str) -> PathBuf {
    let path = output_dir.join(format!("{name}.mp4"));
    std::fs::write(&path, b"\x00\x00\x00\x18ftypmp42").expect("failed to write media fixture");
    path
}

/// Config with the production attempt counts but a short capture deadline, so
/// a missing frame fails fast in tests.
pub fn fast_config() -> ThumbnailConfig {
    ThumbnailConfig {
        capture_timeout_ms: 200,
        ..ThumbnailConfig::default()
    }
}

/// Generator over a stub engine with a virtual clock.
pub fn stub_generator(
    script: StubScript,
) -> (
    ThumbnailGenerator<StubEngine>,
    StubEngine,
    Arc<RecordingSleeper>,
) {
    let engine = StubEngine::new(script);
    let sleeper = Arc::new(RecordingSleeper::new());
    let generator = ThumbnailGenerator::new(engine.clone(), fast_config())
        .with_sleeper(Arc::clone(&sleeper) as _);
    (generator, engine, sleeper)
}

/// Config tuned for real-engine runs: shorter settles, production deadlines.
pub fn real_engine_config() -> ThumbnailConfig {
    ThumbnailConfig {
        seek_settle: PollPolicy::new(10, 100),
        ..ThumbnailConfig::default()
    }
}

/// Generate a small test video using ffmpeg's lavfi test source.
/// Returns the path to the generated file.
pub fn generate_test_video(output_dir: &Path, name: &str, duration_secs: f64) -> PathBuf {
    let output_path = output_dir.join(format!("{name}.mp4"));

    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={duration_secs}:size=640x480:rate=30"),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-preset",
            "ultrafast",
        ])
        .arg(&output_path)
        .stderr(std::process::Stdio::null())
        .status()
        .expect("ffmpeg must be installed to generate test fixtures");

    assert!(
        status.success(),
        "ffmpeg failed to generate test video {name}"
    );
    assert!(output_path.exists(), "test video was not created: {name}");

    output_path
}
