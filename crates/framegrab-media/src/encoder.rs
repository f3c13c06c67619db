use std::io::Cursor;

use framegrab_core::config::{OutputFormat, ThumbnailConfig};
use framegrab_core::frame::RawFrame;
use image::ImageEncoder as _;

use crate::error::{MediaError, Result};

/// Turns a raw RGBA frame into a compressed image container.
pub trait ImageEncoder: Send + Sync {
    fn encode(&self, frame: &RawFrame) -> Result<Vec<u8>>;

    fn format(&self) -> OutputFormat;
}

/// JPEG at a fixed quality. Alpha is dropped.
#[derive(Debug, Clone, Copy)]
pub struct JpegEncoder {
    pub quality: u8,
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self { quality: 85 }
    }
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, frame: &RawFrame) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.quality);
        encoder
            .write_image(
                &frame.to_rgb(),
                frame.width(),
                frame.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| MediaError::EncodeFailed(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Jpeg
    }
}

/// Lossless PNG keeping the alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngEncoder;

impl ImageEncoder for PngEncoder {
    fn encode(&self, frame: &RawFrame) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        image::codecs::png::PngEncoder::new(&mut buffer)
            .write_image(
                frame.data(),
                frame.width(),
                frame.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| MediaError::EncodeFailed(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    fn format(&self) -> OutputFormat {
        OutputFormat::Png
    }
}

/// Encoder matching the config's output format and quality.
pub fn encoder_for(config: &ThumbnailConfig) -> Box<dyn ImageEncoder> {
    match config.format {
        OutputFormat::Jpeg => Box::new(JpegEncoder {
            quality: config.quality,
        }),
        OutputFormat::Png => Box::new(PngEncoder),
    }
}
