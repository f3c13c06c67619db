use std::sync::Arc;

use framegrab_core::config::ThumbnailConfig;
use framegrab_core::frame::RGBA_CHROMA;
use framegrab_core::media::MediaSource;
use tracing::{debug, warn};

use crate::capture::FrameCaptureSync;
use crate::engine::Engine;
use crate::error::{MediaError, Result};

/// One engine instance, one media, one player, for a single request.
///
/// Handles are built in order instance -> media -> player and released in
/// the reverse order. Dropping the session closes it, so every exit path of a
/// request tears the engine objects down.
pub struct PlaybackSession<'e, E: Engine> {
    engine: &'e E,
    instance: Option<E::Instance>,
    media: Option<E::Media>,
    player: Option<E::Player>,
}

impl<'e, E: Engine> PlaybackSession<'e, E> {
    /// Build the instance/media/player triple for `source`.
    ///
    /// Local paths must exist and be readable. If any construction step fails,
    /// whatever was built is released before the error is returned.
    pub fn open(engine: &'e E, source: &MediaSource, config: &ThumbnailConfig) -> Result<Self> {
        if let Some(path) = source.local_path() {
            check_readable(path)?;
        }

        let mut session = Self {
            engine,
            instance: None,
            media: None,
            player: None,
        };

        let instance = engine
            .new_instance(&config.engine_args)
            .ok_or(MediaError::InstanceFailed)?;
        if !engine.set_app_id(&instance, &config.app_id, &config.app_version) {
            debug!("engine has no app identity capability");
        }
        if let Some(name) = &config.extra_interface {
            if !engine.add_interface(&instance, name) {
                warn!(interface = %name, "auxiliary interface not attached");
            }
        }
        let instance = session.instance.insert(instance);

        let media = engine
            .new_media(instance, source)
            .ok_or_else(|| MediaError::MediaFailed(source.to_string()))?;
        let media = session.media.insert(media);

        let player = engine.new_player(media).ok_or(MediaError::PlayerFailed)?;
        session.player = Some(player);

        debug!(%source, "playback session opened");
        Ok(session)
    }

    pub fn engine(&self) -> &'e E {
        self.engine
    }

    /// The player handle. Present for every session returned by `open`.
    pub fn player(&self) -> Option<&E::Player> {
        self.player.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut E::Player> {
        self.player.as_mut()
    }

    /// Ask the render thread for RGBA frames of the sink's size and deliver
    /// them to `sink`.
    pub fn attach_capture(&mut self, sink: &Arc<FrameCaptureSync>) {
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let layout = sink.layout();
        let (width, height) = (layout.width(), layout.height());
        self.engine
            .set_video_format(player, RGBA_CHROMA, width, height, layout.pitch());
        self.engine.set_video_callbacks(player, Arc::clone(sink));
        debug!(width, height, "capture callbacks installed");
    }

    /// Stop playback and release player, media, instance in that order,
    /// skipping whichever are absent. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(mut player) = self.player.take() {
            self.engine.stop(&mut player);
            self.engine.release_player(player);
        }
        if let Some(media) = self.media.take() {
            self.engine.release_media(media);
        }
        if let Some(instance) = self.instance.take() {
            self.engine.release_instance(instance);
        }
    }
}

impl<E: Engine> Drop for PlaybackSession<'_, E> {
    fn drop(&mut self) {
        self.close();
    }
}

fn check_readable(path: &std::path::Path) -> Result<()> {
    match std::fs::File::open(path) {
        Ok(file) => match file.metadata() {
            Ok(meta) if meta.is_file() => Ok(()),
            _ => Err(MediaError::MediaUnreadable(path.to_path_buf())),
        },
        Err(_) => Err(MediaError::MediaUnreadable(path.to_path_buf())),
    }
}
