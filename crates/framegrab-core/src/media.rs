use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the engine should read media from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaSource {
    /// Local filesystem path.
    Path(PathBuf),
    /// Engine-understood location such as `file:///...` or `http://...`.
    Location(String),
}

impl MediaSource {
    /// Classify a caller-supplied string. Anything with a scheme separator is
    /// treated as a location, everything else as a local path.
    pub fn parse(input: &str) -> Self {
        if input.contains("://") {
            Self::Location(input.to_string())
        } else {
            Self::Path(PathBuf::from(input))
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            Self::Location(_) => None,
        }
    }
}

impl From<&Path> for MediaSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for MediaSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Location(l) => f.write_str(l),
        }
    }
}

/// Metadata the engine reports once playback has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub source: MediaSource,
    /// Total length in milliseconds, `None` when the engine reports none (live
    /// or unseekable sources).
    pub duration_ms: Option<i64>,
}

impl MediaInfo {
    pub fn new(source: MediaSource, reported_length_ms: i64) -> Self {
        Self {
            source,
            duration_ms: (reported_length_ms > 0).then_some(reported_length_ms),
        }
    }

    /// Whether a normalized position can be mapped onto the timeline.
    pub fn is_seekable(&self) -> bool {
        self.duration_ms.is_some()
    }
}
