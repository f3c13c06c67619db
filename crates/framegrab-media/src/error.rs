use std::path::PathBuf;
use std::time::Duration;

use framegrab_core::error::CoreError;
use thiserror::Error;

/// Coarse failure classes. Every error collapses to an empty result at the
/// boundary, but the class is kept for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Binding,
    Session,
    PlaybackTimeout,
    CaptureTimeout,
    Encode,
    Config,
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("engine library not found (tried {tried})")]
    LibraryNotFound { tried: String },

    #[error("engine library {library} is missing required symbol {symbol}")]
    MissingSymbol {
        library: String,
        symbol: &'static str,
    },

    #[error("failed to create engine instance")]
    InstanceFailed,

    #[error("media not readable: {0}")]
    MediaUnreadable(PathBuf),

    #[error("failed to open media: {0}")]
    MediaFailed(String),

    #[error("failed to create player")]
    PlayerFailed,

    #[error("engine rejected play request (code {0})")]
    PlayRejected(i32),

    #[error("playback did not start within {0:?}")]
    PlaybackTimeout(Duration),

    #[error("no frame captured within {0:?}")]
    CaptureTimeout(Duration),

    #[error("image encoding failed: {0}")]
    EncodeFailed(String),

    #[error("config error: {0}")]
    Core(#[from] CoreError),
}

impl MediaError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::LibraryNotFound { .. } | Self::MissingSymbol { .. } => FailureKind::Binding,
            Self::InstanceFailed
            | Self::MediaUnreadable(_)
            | Self::MediaFailed(_)
            | Self::PlayerFailed
            | Self::PlayRejected(_) => FailureKind::Session,
            Self::PlaybackTimeout(_) => FailureKind::PlaybackTimeout,
            Self::CaptureTimeout(_) => FailureKind::CaptureTimeout,
            Self::EncodeFailed(_) => FailureKind::Encode,
            Self::Core(_) => FailureKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, MediaError>;
