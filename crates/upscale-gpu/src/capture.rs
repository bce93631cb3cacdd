//! Capture render target.
//!
//! Each filter instance owns one [`CaptureTarget`] and re-renders the
//! upstream frame into it while the frame is dirty. The capture happens
//! inside an isolated pass so its contents are deterministic regardless
//! of whatever state the surrounding pipeline left behind: identity
//! orthographic projection, buffer cleared to transparent, blending,
//! depth/stencil tests and face culling all disabled.

use upscale_core::FrameSize;

use crate::buffer::PixelBuffer;
use crate::pool::{BufferPool, Pooled};
use crate::texture::{Texture, CHANNELS};
use crate::{GpuError, GpuResult};

/// Upstream collaborator that draws the current frame on request.
pub trait FrameSource {
    /// Size of the frame this source would draw right now.
    fn base_size(&self) -> FrameSize;

    /// Draws the current frame into an isolated capture pass.
    fn render(&mut self, pass: &mut CapturePass<'_>);
}

/// Pipeline state pinned for the duration of a capture pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    /// Blending enabled.
    pub blending: bool,
    /// Depth test enabled.
    pub depth_test: bool,
    /// Stencil test enabled.
    pub stencil_test: bool,
    /// Face culling enabled.
    pub face_culling: bool,
    /// Orthographic projection bounds: left, right, top, bottom.
    pub ortho: [f32; 4],
}

impl RenderState {
    /// The isolated state every capture pass runs under.
    pub const fn capture() -> Self {
        Self {
            blending: false,
            depth_test: false,
            stencil_test: false,
            face_culling: false,
            ortho: [0.0, 1.0, 0.0, 1.0],
        }
    }
}

/// Render target owning the per-instance capture buffer.
pub struct CaptureTarget {
    pool: BufferPool<PixelBuffer>,
    frame: Texture,
}

impl CaptureTarget {
    /// Creates the target, preallocating a 1x1 frame so the backing
    /// object exists before the first real capture.
    pub fn new(pool: &BufferPool<PixelBuffer>) -> Self {
        Self {
            pool: pool.clone(),
            frame: Texture::new(pool, FrameSize::new(1, 1)),
        }
    }

    /// Starts a capture pass at `size`.
    ///
    /// A fresh buffer is checked out of the pool (the previous frame may
    /// still be referenced downstream) and cleared to transparent. The
    /// pass commits into this target when it goes out of scope.
    pub fn begin(&mut self, size: FrameSize) -> GpuResult<CapturePass<'_>> {
        if size.is_empty() {
            return Err(GpuError::InvalidDimensions {
                width: size.width,
                height: size.height,
            });
        }

        let mut buffer = self.pool.acquire(size.pixels() as u32, CHANNELS);
        if let Some(buf) = buffer.get_mut() {
            // Recycled buffers carry stale pixels.
            buf.clear();
        }

        Ok(CapturePass {
            target: self,
            size,
            state: RenderState::capture(),
            buffer,
        })
    }

    /// The most recently captured frame.
    pub fn texture(&self) -> Texture {
        self.frame.clone()
    }

    /// Size of the most recently captured frame.
    pub fn size(&self) -> FrameSize {
        self.frame.size()
    }
}

/// An in-progress capture. Commits to its target on drop.
pub struct CapturePass<'a> {
    target: &'a mut CaptureTarget,
    size: FrameSize,
    state: RenderState,
    buffer: Pooled<PixelBuffer>,
}

impl CapturePass<'_> {
    /// The pinned pipeline state for this pass.
    #[inline]
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Size being captured.
    #[inline]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Copies a full interleaved RGBA frame into the capture buffer.
    pub fn blit(&mut self, data: &[f32]) -> GpuResult<()> {
        let expected = self.size.pixels() as usize * CHANNELS as usize;
        if data.len() != expected {
            return Err(GpuError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.data_mut().copy_from_slice(data);
        Ok(())
    }

    /// Writes one RGBA pixel; coordinates outside the pass are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [f32; 4]) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * CHANNELS as usize;
        self.data_mut()[idx..idx + 4].copy_from_slice(&rgba);
    }

    fn data_mut(&mut self) -> &mut [f32] {
        self.buffer
            .get_mut()
            .expect("capture buffer is uniquely held during the pass")
            .data_mut()
    }
}

impl Drop for CapturePass<'_> {
    fn drop(&mut self) {
        // Shape matches by construction, so this cannot fail.
        if let Ok(frame) = Texture::from_buffer(self.size, self.buffer.clone()) {
            self.target.frame = frame;
        }
    }
}
