use framegrab_core::config::ThumbnailConfig;
use framegrab_core::timing::{PollPolicy, Sleeper};
use serde::Serialize;
use tracing::debug;

use crate::engine::Engine;
use crate::error::{MediaError, Result};
use crate::session::PlaybackSession;

/// Where the player was sent before capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeekOutcome {
    /// Duration known; seeked to `duration_ms * position`.
    Positioned { target_ms: i64, duration_ms: i64 },
    /// Duration unknown; seeked to the fixed fallback offset.
    Fallback { target_ms: i64 },
}

impl SeekOutcome {
    pub fn target_ms(&self) -> i64 {
        match *self {
            Self::Positioned { target_ms, .. } | Self::Fallback { target_ms } => target_ms,
        }
    }
}

/// Map a normalized position onto a known duration. The position is not
/// clamped.
pub fn seek_target_ms(duration_ms: i64, position: f64) -> i64 {
    (duration_ms as f64 * position) as i64
}

/// Start playback and wait until the player reports "playing".
pub fn start_playback<E: Engine>(
    session: &mut PlaybackSession<'_, E>,
    poll: &PollPolicy,
    sleeper: &dyn Sleeper,
) -> Result<()> {
    let engine = session.engine();
    let player = session.player_mut().ok_or(MediaError::PlayerFailed)?;

    let rc = engine.play(player);
    if rc != 0 {
        return Err(MediaError::PlayRejected(rc));
    }
    debug!("playback started");

    let player = session.player().ok_or(MediaError::PlayerFailed)?;
    if !poll.poll_until(sleeper, || engine.is_playing(player)) {
        return Err(MediaError::PlaybackTimeout(poll.total()));
    }
    debug!("player reports playing");
    Ok(())
}

/// Drive a freshly opened session to `position` and let it settle.
///
/// Every wait is bounded: the "playing" poll by `config.play_poll`, the
/// settle by `config.seek_settle` (or `fallback_settle_ms` when the duration
/// is unknown). The engine gives no seek-completed signal, so the settle is
/// slept out in full.
pub fn drive_to_position<E: Engine>(
    session: &mut PlaybackSession<'_, E>,
    position: f64,
    config: &ThumbnailConfig,
    sleeper: &dyn Sleeper,
) -> Result<SeekOutcome> {
    start_playback(session, &config.play_poll, sleeper)?;

    let engine = session.engine();
    let player = session.player_mut().ok_or(MediaError::PlayerFailed)?;
    let duration_ms = engine.length_ms(player);

    let outcome = if duration_ms > 0 {
        let target_ms = seek_target_ms(duration_ms, position);
        debug!(target_ms, duration_ms, position, "seeking");
        engine.set_time_ms(player, target_ms);
        config.seek_settle.wait_out(sleeper);
        SeekOutcome::Positioned {
            target_ms,
            duration_ms,
        }
    } else {
        // May land past the end of clips shorter than the offset.
        let target_ms = config.fallback_seek_ms;
        debug!(target_ms, "duration unknown, seeking to fixed offset");
        engine.set_time_ms(player, target_ms);
        sleeper.sleep(config.fallback_settle());
        SeekOutcome::Fallback { target_ms }
    };

    Ok(outcome)
}
