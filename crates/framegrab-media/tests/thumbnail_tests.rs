use std::time::Duration;

use framegrab_core::config::OutputFormat;
use framegrab_core::error::CoreError;
use framegrab_core::frame::RawFrame;
use framegrab_core::media::MediaSource;
use framegrab_core::request::ThumbnailRequest;
use framegrab_media::encoder::ImageEncoder;
use framegrab_media::error::{FailureKind, MediaError, Result};
use framegrab_media::seek::SeekOutcome;
use framegrab_media::thumbnail::ThumbnailGenerator;
use framegrab_test_harness::assertions::{
    assert_image_dimensions, assert_jpeg, assert_png, assert_session_balanced,
    assert_single_buffer,
};
use framegrab_test_harness::fixtures::{fast_config, fixture_dir, stub_generator, touch_media};
use framegrab_test_harness::stub_engine::{FrameScript, StubEngine, StubScript};

struct FailingEncoder;

impl ImageEncoder for FailingEncoder {
    fn encode(&self, _frame: &RawFrame) -> Result<Vec<u8>> {
        Err(MediaError::EncodeFailed("disk full".into()))
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }
}

#[test]
fn test_generates_jpeg_at_requested_position() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, sleeper) = stub_generator(StubScript::default());

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap();

    assert_jpeg(&thumb.data);
    assert_image_dimensions(&thumb.data, 320, 240);
    assert_eq!((thumb.width, thumb.height), (320, 240));
    assert_eq!(thumb.format, OutputFormat::Jpeg);
    assert_eq!(
        thumb.seek,
        SeekOutcome::Positioned {
            target_ms: 30_000,
            duration_ms: 60_000
        }
    );

    let counts = engine.counts();
    assert_eq!(counts.seeks, vec![30_000]);
    assert_eq!(counts.plays, 1);
    assert_session_balanced(&counts);
    assert_single_buffer(&counts);
    // Two "not yet playing" polls, then the full settle.
    assert_eq!(sleeper.total(), Duration::from_millis(2 * 50 + 50 * 100));
}

#[test]
fn test_non_positive_size_takes_defaults() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, _) = stub_generator(StubScript::default());

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 0, -5, 0.5)
        .unwrap();

    assert_image_dimensions(&thumb.data, 320, 240);
    assert_eq!(
        engine.counts().video_formats,
        vec![("RGBA".to_string(), 320, 240, 1280)]
    );
}

#[test]
fn test_missing_file_fails_before_engine_work() {
    let dir = fixture_dir();
    let (generator, engine, sleeper) = stub_generator(StubScript::default());

    let err = generator
        .generate(
            &MediaSource::from(dir.path().join("missing.mp4")),
            320,
            240,
            0.5,
        )
        .unwrap_err();

    assert!(matches!(err, MediaError::MediaUnreadable(_)));
    assert_eq!(err.kind(), FailureKind::Session);
    let counts = engine.counts();
    assert_eq!(counts.instances_created, 0);
    assert_eq!(counts.plays, 0);
    assert_eq!(sleeper.count(), 0);
}

#[test]
fn test_directory_is_not_readable_media() {
    let dir = fixture_dir();
    let (generator, engine, _) = stub_generator(StubScript::default());

    let err = generator
        .generate(&MediaSource::from(dir.path()), 320, 240, 0.5)
        .unwrap_err();

    assert!(matches!(err, MediaError::MediaUnreadable(_)));
    assert_eq!(engine.counts().instances_created, 0);
}

#[test]
fn test_unknown_duration_uses_fallback_offset() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "live");
    let (generator, engine, sleeper) = stub_generator(StubScript::unknown_duration());

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.9)
        .unwrap();

    assert_eq!(thumb.seek, SeekOutcome::Fallback { target_ms: 5000 });
    assert_eq!(engine.counts().seeks, vec![5000]);
    assert_eq!(
        sleeper.sleeps(),
        vec![
            Duration::from_millis(50),
            Duration::from_millis(50),
            Duration::from_millis(500)
        ]
    );
    assert_image_dimensions(&thumb.data, 320, 240);
}

#[test]
fn test_never_playing_times_out_after_five_seconds() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "stuck");
    let (generator, engine, sleeper) = stub_generator(StubScript::never_playing());

    let err = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap_err();

    assert!(matches!(err, MediaError::PlaybackTimeout(d) if d == Duration::from_secs(5)));
    assert_eq!(err.kind(), FailureKind::PlaybackTimeout);
    assert_eq!(sleeper.total(), Duration::from_secs(5));

    let counts = engine.counts();
    assert_eq!(counts.is_playing_polls, 101);
    assert!(counts.seeks.is_empty());
    assert_session_balanced(&counts);
}

#[test]
fn test_no_frame_is_capture_timeout() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "black");
    let (generator, engine, _) = stub_generator(StubScript::no_frames());

    let err = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap_err();

    assert!(matches!(err, MediaError::CaptureTimeout(_)));
    assert_eq!(err.kind(), FailureKind::CaptureTimeout);
    assert_session_balanced(&engine.counts());
}

#[test]
fn test_allocated_but_never_presented_is_capture_timeout() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, _) = stub_generator(StubScript {
        frames: FrameScript::AllocateOnly,
        ..StubScript::default()
    });

    let err = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::CaptureTimeout);
    let counts = engine.counts();
    assert_eq!(counts.buffer_addresses.len(), 1);
    assert_session_balanced(&counts);
}

#[test]
fn test_bind_failure_touches_nothing() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, _) = stub_generator(StubScript {
        bind_fails: true,
        ..StubScript::default()
    });

    let err = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Binding);
    let counts = engine.counts();
    assert_eq!(counts.bind_calls, 1);
    assert_eq!(counts.instances_created, 0);
}

#[test]
fn test_oversized_dimensions_rejected_before_binding() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, sleeper) = stub_generator(StubScript::default());

    for (width, height) in [(i32::MAX as i64, 1), (1, i32::MAX as i64), (i64::MAX, i64::MAX)] {
        let err = generator
            .generate(&MediaSource::from(video.as_path()), width, height, 0.5)
            .unwrap_err();
        assert!(
            matches!(err, MediaError::Core(CoreError::FrameDimensions { .. })),
            "{width}x{height}: {err}"
        );
        assert_eq!(err.kind(), FailureKind::Config);
    }

    let counts = engine.counts();
    assert_eq!(counts.bind_calls, 0);
    assert_eq!(counts.instances_created, 0);
    assert!(counts.video_formats.is_empty());
    assert_eq!(sleeper.count(), 0);
}

#[test]
fn test_construction_failures_release_partial_session() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let source = MediaSource::from(video.as_path());

    let cases = [
        StubScript {
            instance_fails: true,
            ..StubScript::default()
        },
        StubScript {
            media_fails: true,
            ..StubScript::default()
        },
        StubScript {
            player_fails: true,
            ..StubScript::default()
        },
    ];

    for script in cases {
        let (generator, engine, _) = stub_generator(script.clone());
        let err = generator.generate(&source, 320, 240, 0.5).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Session, "{script:?}");

        let counts = engine.counts();
        assert_session_balanced(&counts);
        assert_eq!(counts.plays, 0);
        if script.media_fails {
            assert!(matches!(err, MediaError::MediaFailed(_)));
            assert_eq!(counts.instances_released, 1);
        }
        if script.player_fails {
            assert!(matches!(err, MediaError::PlayerFailed));
            assert_eq!(counts.media_released, 1);
            assert_eq!(counts.instances_released, 1);
        }
    }
}

#[test]
fn test_rejected_play_is_session_failure() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, sleeper) = stub_generator(StubScript {
        play_code: -1,
        ..StubScript::default()
    });

    let err = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap_err();

    assert!(matches!(err, MediaError::PlayRejected(-1)));
    assert_eq!(err.kind(), FailureKind::Session);
    let counts = engine.counts();
    assert_eq!(counts.is_playing_polls, 0);
    assert_eq!(sleeper.count(), 0);
    assert_session_balanced(&counts);
}

#[test]
fn test_encode_failure_still_tears_down() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, _) = stub_generator(StubScript::default());
    let generator = generator.with_encoder(Box::new(FailingEncoder));

    let err = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Encode);
    assert_session_balanced(&engine.counts());
}

#[test]
fn test_engine_receives_configured_arguments() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, _) = stub_generator(StubScript::default());

    generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap();

    let counts = engine.counts();
    assert_eq!(counts.engine_args, vec![generator.config().engine_args.clone()]);
    assert!(counts.engine_args[0].iter().any(|a| a == "--no-audio"));
    assert_eq!(counts.app_ids, vec!["framegrab".to_string()]);
    assert!(counts.interfaces.is_empty());
    assert_eq!(counts.sources, vec![MediaSource::from(video.as_path())]);
}

#[test]
fn test_extra_interface_is_attached() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let engine = StubEngine::new(StubScript::default());
    let config = framegrab_core::config::ThumbnailConfig {
        extra_interface: Some("dummy".to_string()),
        ..fast_config()
    };
    let generator = ThumbnailGenerator::new(engine.clone(), config).with_sleeper(
        std::sync::Arc::new(framegrab_test_harness::sleeper::RecordingSleeper::new()),
    );

    generator
        .generate(&MediaSource::from(video.as_path()), 160, 120, 0.1)
        .unwrap();

    assert_eq!(engine.counts().interfaces, vec!["dummy".to_string()]);
}

#[test]
fn test_png_output() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let engine = StubEngine::new(StubScript::default());
    let config = framegrab_core::config::ThumbnailConfig {
        format: OutputFormat::Png,
        ..fast_config()
    };
    let generator = ThumbnailGenerator::new(engine.clone(), config).with_sleeper(
        std::sync::Arc::new(framegrab_test_harness::sleeper::RecordingSleeper::new()),
    );

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 64, 48, 0.5)
        .unwrap();

    assert_png(&thumb.data);
    assert_image_dimensions(&thumb.data, 64, 48);
    assert_eq!(thumb.format, OutputFormat::Png);
    let pixel = image::load_from_memory(&thumb.data)
        .unwrap()
        .to_rgba8()
        .get_pixel(10, 10)
        .0;
    assert_eq!(pixel, [0x80, 0x80, 0x80, 0x80]);
}

#[test]
fn test_location_source_skips_file_check() {
    let (generator, engine, _) = stub_generator(StubScript::default());
    let source = MediaSource::parse("http://example.invalid/stream.m3u8");

    generator.generate(&source, 320, 240, 0.5).unwrap();

    assert_eq!(engine.counts().sources, vec![source]);
}

#[test]
fn test_out_of_range_position_passes_through() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, engine, _) = stub_generator(StubScript::default());

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 1.5)
        .unwrap();

    assert_eq!(thumb.seek.target_ms(), 90_000);
    assert_eq!(engine.counts().seeks, vec![90_000]);
}

#[test]
fn test_batch_keeps_request_order() {
    let dir = fixture_dir();
    let (generator, engine, _) = stub_generator(StubScript::default());

    let mut requests: Vec<_> = (1..=6)
        .map(|i| {
            let video = touch_media(dir.path(), &format!("clip{i}"));
            ThumbnailRequest::new(video, 16 * i, 8 * i, 0.25)
        })
        .collect();
    requests.push(ThumbnailRequest::new(dir.path().join("gone.mp4"), 16, 8, 0.25));

    let results = generator.generate_batch(&requests);
    assert_eq!(results.len(), 7);
    for (i, result) in results[..6].iter().enumerate() {
        let thumb = result.as_ref().unwrap();
        let n = i as u32 + 1;
        assert_eq!((thumb.width, thumb.height), (16 * n, 8 * n));
        assert_image_dimensions(&thumb.data, 16 * n, 8 * n);
    }
    assert!(matches!(results[6], Err(MediaError::MediaUnreadable(_))));

    let counts = engine.counts();
    assert_eq!(counts.players_created, 6);
    assert_session_balanced(&counts);
}

#[test]
fn test_thumbnail_report_serializes_without_bytes() {
    let dir = fixture_dir();
    let video = touch_media(dir.path(), "clip");
    let (generator, _, _) = stub_generator(StubScript::default());

    let thumb = generator
        .generate(&MediaSource::from(video.as_path()), 320, 240, 0.5)
        .unwrap();
    let json = serde_json::to_value(&thumb).unwrap();

    assert!(json.get("data").is_none());
    assert_eq!(json["format"], "jpeg");
    assert_eq!(json["seek"]["kind"], "positioned");
    assert_eq!(json["seek"]["target_ms"], 30_000);
    assert!(json["timings"]["capture_ms"].is_number());
}
