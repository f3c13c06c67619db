use std::sync::Arc;

use framegrab_core::config::{OutputFormat, ThumbnailConfig};
use framegrab_core::media::{MediaInfo, MediaSource};
use framegrab_core::request::{CaptureRequestParams, ThumbnailRequest};
use framegrab_core::timing::{Sleeper, ThreadSleeper};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, info_span};

use crate::binder::global_binder;
use crate::capture::FrameCaptureSync;
use crate::encoder::{ImageEncoder, encoder_for};
use crate::engine::EngineProvider;
use crate::error::{MediaError, Result};
use crate::probe;
use crate::profile::{Stage, StageClock, StageTimings};
use crate::seek::{SeekOutcome, drive_to_position};
use crate::session::PlaybackSession;

/// A compressed still frame.
#[derive(Debug, Clone, Serialize)]
pub struct Thumbnail {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub seek: SeekOutcome,
    pub timings: StageTimings,
}

/// Runs thumbnail requests against an engine.
pub struct ThumbnailGenerator<P: EngineProvider> {
    provider: P,
    config: ThumbnailConfig,
    encoder: Box<dyn ImageEncoder>,
    sleeper: Arc<dyn Sleeper>,
}

impl<P: EngineProvider> ThumbnailGenerator<P> {
    pub fn new(provider: P, config: ThumbnailConfig) -> Self {
        let encoder = encoder_for(&config);
        Self {
            provider,
            config,
            encoder,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_encoder(mut self, encoder: Box<dyn ImageEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Grab one frame of `source` at normalized `position`, scaled to
    /// `width` x `height` (non-positive values take the configured defaults).
    pub fn generate(
        &self,
        source: &MediaSource,
        width: i64,
        height: i64,
        position: f64,
    ) -> Result<Thumbnail> {
        self.run(&ThumbnailRequest::new(source.clone(), width, height, position))
    }

    pub fn run(&self, request: &ThumbnailRequest) -> Result<Thumbnail> {
        let span = info_span!("thumbnail", id = %request.id, source = %request.source);
        let _enter = span.enter();

        info!(
            width = request.width,
            height = request.height,
            position = request.position,
            "thumbnail requested"
        );
        let result = self.run_inner(request);
        match &result {
            Ok(thumb) => info!(
                bytes = thumb.data.len(),
                total_ms = thumb.timings.total_ms(),
                "thumbnail generated"
            ),
            Err(e) => error!(kind = ?e.kind(), error = %e, "thumbnail failed"),
        }
        result
    }

    fn run_inner(&self, request: &ThumbnailRequest) -> Result<Thumbnail> {
        let params = CaptureRequestParams::new(
            request.width,
            request.height,
            request.position,
            self.config.default_size(),
        );
        // Reject sizes whose buffer cannot be represented before any engine
        // object exists.
        let layout = params.layout()?;
        let mut clock = StageClock::start();

        let engine = self.provider.engine()?;
        clock.mark(Stage::Bind);

        let sync = Arc::new(FrameCaptureSync::new(layout));
        let mut session = PlaybackSession::open(&engine, &request.source, &self.config)?;
        session.attach_capture(&sync);
        clock.mark(Stage::Open);

        let seek = drive_to_position(
            &mut session,
            params.position,
            &self.config,
            self.sleeper.as_ref(),
        )?;
        clock.mark(Stage::Seek);

        let state = sync.wait_for_frame(self.config.capture_timeout());
        clock.mark(Stage::Capture);

        // Stop the render thread before touching the buffer it writes into.
        session.close();
        clock.mark(Stage::Teardown);

        let frame = sync.take_frame();
        let frame = match frame {
            Some(frame) if state.success => frame,
            _ => {
                debug!(allocated = state.frame_allocated, "no frame presented");
                return Err(MediaError::CaptureTimeout(self.config.capture_timeout()));
            }
        };

        let data = self.encoder.encode(&frame)?;
        drop(frame);
        clock.mark(Stage::Encode);

        Ok(Thumbnail {
            data,
            width: params.target_width,
            height: params.target_height,
            format: self.encoder.format(),
            seek,
            timings: clock.finish(),
        })
    }

    /// Run several requests in parallel. Results keep the input order.
    pub fn generate_batch(&self, requests: &[ThumbnailRequest]) -> Vec<Result<Thumbnail>> {
        requests.par_iter().map(|request| self.run(request)).collect()
    }

    /// Report the media's duration without capturing a frame.
    pub fn probe(&self, source: &MediaSource) -> Result<MediaInfo> {
        probe::probe(&self.provider, source, &self.config, self.sleeper.as_ref())
    }
}

/// Synchronous entry point: compressed image bytes, or `None` on any failure.
///
/// Uses the process-wide libvlc binder and the default config with
/// `FRAMEGRAB_*` environment overrides. Failures are logged with their kind.
pub fn generate_thumbnail(
    media_path: &str,
    width: i32,
    height: i32,
    position: f32,
) -> Option<Vec<u8>> {
    let config = match ThumbnailConfig::default().with_env_overrides() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid thumbnail configuration");
            return None;
        }
    };
    let generator = ThumbnailGenerator::new(global_binder(&config), config);
    generator
        .generate(
            &MediaSource::parse(media_path),
            width.into(),
            height.into(),
            position.into(),
        )
        .ok()
        .map(|thumb| thumb.data)
}
