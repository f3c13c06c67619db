use std::path::PathBuf;

use framegrab_core::error::CoreError;
use framegrab_media::error::MediaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("{failed} of {total} thumbnails failed")]
    Partial { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, CliError>;
