use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::frame::FrameLayout;
use crate::media::MediaSource;

pub const DEFAULT_WIDTH: u32 = 320;
pub const DEFAULT_HEIGHT: u32 = 240;

/// Validated capture parameters for one request.
///
/// Dimensions are always positive. The position is passed through unclamped;
/// values outside 0.0..=1.0 reach the seek computation as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRequestParams {
    pub target_width: u32,
    pub target_height: u32,
    pub position: f64,
}

impl CaptureRequestParams {
    /// Build params from caller input, substituting `defaults` for any
    /// non-positive dimension.
    pub fn new(width: i64, height: i64, position: f64, defaults: (u32, u32)) -> Self {
        Self {
            target_width: positive_or(width, defaults.0),
            target_height: positive_or(height, defaults.1),
            position,
        }
    }

    /// Same as [`CaptureRequestParams::new`] with the 320x240 defaults.
    pub fn with_default_size(width: i64, height: i64, position: f64) -> Self {
        Self::new(width, height, position, (DEFAULT_WIDTH, DEFAULT_HEIGHT))
    }

    /// Byte geometry of the frame to capture. Fails for dimensions whose
    /// stride or buffer size cannot be represented.
    pub fn layout(&self) -> Result<FrameLayout> {
        FrameLayout::new(self.target_width, self.target_height)
    }
}

fn positive_or(value: i64, default: u32) -> u32 {
    if value > 0 {
        u32::try_from(value).unwrap_or(u32::MAX)
    } else {
        default
    }
}

/// One thumbnail request, tagged with an id for log correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailRequest {
    pub id: Uuid,
    pub source: MediaSource,
    pub width: i64,
    pub height: i64,
    pub position: f64,
}

impl ThumbnailRequest {
    pub fn new(source: impl Into<MediaSource>, width: i64, height: i64, position: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            width,
            height,
            position,
        }
    }
}
