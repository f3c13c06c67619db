use std::path::PathBuf;

use framegrab_core::config::{OutputFormat, ThumbnailConfig};
use framegrab_core::error::CoreError;
use framegrab_core::timing::PollPolicy;

#[test]
fn test_default_values() {
    let config = ThumbnailConfig::default();
    assert_eq!(config.default_size(), (320, 240));
    assert_eq!(config.quality, 85);
    assert_eq!(config.format, OutputFormat::Jpeg);
    assert_eq!(config.play_poll, PollPolicy::new(100, 50));
    assert_eq!(config.play_poll.total().as_millis(), 5000);
    assert_eq!(config.seek_settle.total().as_millis(), 5000);
    assert_eq!(config.fallback_seek_ms, 5000);
    assert_eq!(config.fallback_settle().as_millis(), 500);
    assert_eq!(config.capture_timeout().as_secs(), 10);
    assert!(config.engine_args.iter().any(|a| a == "--no-audio"));
    assert_eq!(config.library_names[0], "libvlc.so");
}

#[test]
fn test_partial_json_falls_back_to_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("framegrab.json");
    std::fs::write(
        &path,
        r#"{
            "format": "png",
            "capture_timeout_ms": 250,
            "play_poll": { "attempts": 3, "interval_ms": 1 }
        }"#,
    )
    .unwrap();

    let config = ThumbnailConfig::from_json_file(&path).unwrap();
    assert_eq!(config.format, OutputFormat::Png);
    assert_eq!(config.capture_timeout_ms, 250);
    assert_eq!(config.play_poll.attempts, 3);
    assert_eq!(config.quality, 85);
    assert_eq!(config.default_size(), (320, 240));
}

#[test]
fn test_invalid_quality_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, r#"{ "quality": 150 }"#).unwrap();

    let err = ThumbnailConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, CoreError::InvalidConfig { field: "quality", .. }));
}

#[test]
fn test_missing_config_file() {
    let err = ThumbnailConfig::from_json_file(&PathBuf::from("/nonexistent/framegrab.json"))
        .unwrap_err();
    assert!(matches!(err, CoreError::ConfigRead { .. }));
}

#[test]
fn test_malformed_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = ThumbnailConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, CoreError::Serialization(_)));
}

#[test]
fn test_library_path_tried_first() {
    let config = ThumbnailConfig {
        library_path: Some(PathBuf::from("/opt/vlc/libvlc.so")),
        ..ThumbnailConfig::default()
    };
    let candidates = config.library_candidates();
    assert_eq!(candidates[0], "/opt/vlc/libvlc.so");
    assert_eq!(candidates.len(), config.library_names.len() + 1);
}

#[test]
fn test_config_serializes_roundtrip_lowercase_format() {
    let json = serde_json::to_string(&ThumbnailConfig::default()).unwrap();
    assert!(json.contains(r#""format":"jpeg""#));
}
