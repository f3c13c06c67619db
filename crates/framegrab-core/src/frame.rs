use crate::error::{CoreError, Result};

/// Bytes per pixel of every frame the engine renders for us.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Chroma name handed to the engine when configuring its video output.
pub const RGBA_CHROMA: &str = "RGBA";

/// Largest width or height a frame may have.
pub const MAX_DIMENSION: u32 = 16_384;

/// Byte geometry of an RGBA frame, checked once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    width: u32,
    height: u32,
    pitch: u32,
    len: usize,
}

impl FrameLayout {
    /// Fails when either dimension exceeds [`MAX_DIMENSION`] or the row
    /// stride or buffer size would overflow.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let invalid = || CoreError::FrameDimensions { width, height };
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(invalid());
        }
        let pitch = width.checked_mul(BYTES_PER_PIXEL).ok_or_else(invalid)?;
        let len = usize::try_from(pitch)
            .ok()
            .and_then(|pitch| pitch.checked_mul(usize::try_from(height).ok()?))
            .ok_or_else(invalid)?;
        Ok(Self {
            width,
            height,
            pitch,
            len,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Total buffer size in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Decoded still frame with raw pixel data.
///
/// The buffer is allocated once at its final size and never reallocated, so
/// the address handed to the engine stays valid for the frame's lifetime.
pub struct RawFrame {
    layout: FrameLayout,
    /// RGBA pixel data, row-major, 4 bytes per pixel.
    data: Box<[u8]>,
}

impl RawFrame {
    /// Allocate a zeroed frame.
    pub fn alloc(layout: FrameLayout) -> Self {
        Self {
            layout,
            data: vec![0u8; layout.len()].into_boxed_slice(),
        }
    }

    /// Wrap an existing RGBA buffer, checking its size.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let layout = FrameLayout::new(width, height)?;
        if data.len() != layout.len() {
            return Err(CoreError::FrameSize {
                expected: layout.len(),
                actual: data.len(),
            });
        }
        Ok(Self {
            layout,
            data: data.into_boxed_slice(),
        })
    }

    pub fn width(&self) -> u32 {
        self.layout.width()
    }

    pub fn height(&self) -> u32 {
        self.layout.height()
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Row stride in bytes.
    pub fn pitch(&self) -> u32 {
        self.layout.pitch()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Raw pointer to the first plane, for engines that write into it directly.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    /// Copy out RGB triples, dropping the alpha channel.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.data.len() / 4 * 3);
        for px in self.data.chunks_exact(BYTES_PER_PIXEL as usize) {
            rgb.extend_from_slice(&px[..3]);
        }
        rgb
    }
}

impl std::fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawFrame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("bytes", &self.data.len())
            .finish()
    }
}
