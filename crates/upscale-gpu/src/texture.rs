//! Shared frame texture backed by a pooled buffer.

use upscale_core::FrameSize;

use crate::buffer::PixelBuffer;
use crate::pool::{BufferPool, Pooled};
use crate::{GpuError, GpuResult};

/// Interleaved channels per pixel (RGBA).
pub const CHANNELS: u8 = 4;

/// An RGBA f32 frame, cheap to clone and share across the pipeline.
///
/// The payload lives in a pooled buffer; cloning bumps the checkout
/// handle's reference count, and the buffer returns to its pool when the
/// last clone (and any pass holding it) is gone.
#[derive(Clone)]
pub struct Texture {
    size: FrameSize,
    buffer: Pooled<PixelBuffer>,
}

impl Texture {
    /// Allocates a zeroed texture of `size` from `pool`.
    pub fn new(pool: &BufferPool<PixelBuffer>, size: FrameSize) -> Self {
        let mut buffer = pool.acquire(size.pixels() as u32, CHANNELS);
        if let Some(buf) = buffer.get_mut() {
            buf.clear();
        }
        Self { size, buffer }
    }

    /// Wraps an already-filled pooled buffer.
    ///
    /// The buffer's shape must be exactly `(size.pixels(), CHANNELS)`.
    pub fn from_buffer(size: FrameSize, buffer: Pooled<PixelBuffer>) -> GpuResult<Self> {
        let expected = size.pixels() as usize * CHANNELS as usize;
        if buffer.shape().elements() != expected {
            return Err(GpuError::SizeMismatch {
                expected,
                actual: buffer.shape().elements(),
            });
        }
        Ok(Self { size, buffer })
    }

    /// Allocates a texture and fills it from an interleaved RGBA slice.
    pub fn from_pixels(
        pool: &BufferPool<PixelBuffer>,
        size: FrameSize,
        data: &[f32],
    ) -> GpuResult<Self> {
        let expected = size.pixels() as usize * CHANNELS as usize;
        if data.len() != expected {
            return Err(GpuError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        let mut buffer = pool.acquire(size.pixels() as u32, CHANNELS);
        if let Some(buf) = buffer.get_mut() {
            buf.data_mut().copy_from_slice(data);
        }
        Ok(Self { size, buffer })
    }

    /// Frame dimensions.
    #[inline]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Interleaved RGBA data, row-major.
    #[inline]
    pub fn data(&self) -> &[f32] {
        self.buffer.data()
    }

    /// RGBA value at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * CHANNELS as usize;
        let d = self.buffer.data();
        Some([d[idx], d[idx + 1], d[idx + 2], d[idx + 3]])
    }

    /// Identity of the backing allocation.
    ///
    /// Two textures sharing one pooled buffer report the same id.
    #[inline]
    pub fn buffer_id(&self) -> u64 {
        self.buffer.id()
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("size", &self.size)
            .field("buffer_id", &self.buffer.id())
            .finish()
    }
}
