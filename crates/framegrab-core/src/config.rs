use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::request::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::timing::PollPolicy;

/// Env var naming an explicit engine library path, tried before the
/// configured candidate names.
pub const LIBRARY_ENV: &str = "FRAMEGRAB_LIBVLC";

/// Env var overriding the frame capture deadline in milliseconds.
pub const CAPTURE_TIMEOUT_ENV: &str = "FRAMEGRAB_CAPTURE_TIMEOUT_MS";

/// Compressed output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Every tunable of the thumbnail pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub default_width: u32,
    pub default_height: u32,
    pub format: OutputFormat,
    /// JPEG quality, 0-100. Ignored for PNG.
    pub quality: u8,
    /// Waiting for the player to report "playing".
    pub play_poll: PollPolicy,
    /// Settle time after seeking to a computed position.
    pub seek_settle: PollPolicy,
    /// Absolute seek target when the duration is unknown.
    pub fallback_seek_ms: i64,
    /// Settle time after the fallback seek.
    pub fallback_settle_ms: u64,
    /// Deadline for the render thread to present a frame.
    pub capture_timeout_ms: u64,
    /// Options passed to the engine instance.
    pub engine_args: Vec<String>,
    /// Candidate engine library file names, tried in order.
    pub library_names: Vec<String>,
    /// Explicit library path, tried before `library_names`.
    pub library_path: Option<PathBuf>,
    pub app_id: String,
    pub app_version: String,
    /// Auxiliary engine interface to attach, when the engine supports it.
    pub extra_interface: Option<String>,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            default_width: DEFAULT_WIDTH,
            default_height: DEFAULT_HEIGHT,
            format: OutputFormat::Jpeg,
            quality: 85,
            play_poll: PollPolicy::new(100, 50),
            seek_settle: PollPolicy::new(50, 100),
            fallback_seek_ms: 5000,
            fallback_settle_ms: 500,
            capture_timeout_ms: 10_000,
            engine_args: default_engine_args(),
            library_names: default_library_names(),
            library_path: None,
            app_id: "framegrab".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            extra_interface: None,
        }
    }
}

/// Minimal-footprint instance options: no UI, no window, no audio, no chatter.
pub fn default_engine_args() -> Vec<String> {
    [
        "--intf",
        "dummy",
        "--vout",
        "dummy",
        "--no-audio",
        "--no-video-title-show",
        "--no-stats",
        "--no-sub-autodetect-file",
        "--no-snapshot-preview",
        "--no-osd",
        "--quiet",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_library_names() -> Vec<String> {
    ["libvlc.so", "libvlc.so.5", "libvlc.dylib", "libvlc.dll"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl ThumbnailConfig {
    /// Load a JSON config. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FRAMEGRAB_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = std::env::var(LIBRARY_ENV) {
            if !path.is_empty() {
                self.library_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(ms) = std::env::var(CAPTURE_TIMEOUT_ENV) {
            self.capture_timeout_ms = ms.trim().parse().map_err(|_| CoreError::InvalidConfig {
                field: "capture_timeout_ms",
                reason: format!("{CAPTURE_TIMEOUT_ENV}={ms} is not a number of milliseconds"),
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_width == 0 || self.default_height == 0 {
            return Err(CoreError::InvalidConfig {
                field: "default_width/default_height",
                reason: "default dimensions must be positive".into(),
            });
        }
        if self.quality > 100 {
            return Err(CoreError::InvalidConfig {
                field: "quality",
                reason: format!("{} is outside 0-100", self.quality),
            });
        }
        if self.library_names.is_empty() && self.library_path.is_none() {
            return Err(CoreError::InvalidConfig {
                field: "library_names",
                reason: "no engine library to try".into(),
            });
        }
        Ok(())
    }

    pub fn default_size(&self) -> (u32, u32) {
        (self.default_width, self.default_height)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    pub fn fallback_settle(&self) -> Duration {
        Duration::from_millis(self.fallback_settle_ms)
    }

    /// Library candidates in the order the binder should try them.
    pub fn library_candidates(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.library_names.len() + 1);
        if let Some(path) = &self.library_path {
            names.push(path.to_string_lossy().to_string());
        }
        names.extend(self.library_names.iter().cloned());
        names
    }
}
