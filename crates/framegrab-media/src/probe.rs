use framegrab_core::config::ThumbnailConfig;
use framegrab_core::media::{MediaInfo, MediaSource};
use framegrab_core::timing::Sleeper;
use tracing::debug;

use crate::engine::{Engine, EngineProvider};
use crate::error::Result;
use crate::seek::start_playback;
use crate::session::PlaybackSession;

/// Start playing `source` just long enough to read its duration.
pub fn probe<P: EngineProvider>(
    provider: &P,
    source: &MediaSource,
    config: &ThumbnailConfig,
    sleeper: &dyn Sleeper,
) -> Result<MediaInfo> {
    let engine = provider.engine()?;
    let mut session = PlaybackSession::open(&engine, source, config)?;
    start_playback(&mut session, &config.play_poll, sleeper)?;

    let length_ms = session
        .player()
        .map(|player| engine.length_ms(player))
        .unwrap_or(0);
    debug!(%source, length_ms, "probed media");

    Ok(MediaInfo::new(source.clone(), length_ms))
}
