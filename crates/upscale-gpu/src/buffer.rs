//! Fixed-shape pixel buffer, the pooled object used by this stage.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::pool::{BufferPool, BufferShape};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

/// A fixed-shape f32 pixel payload.
///
/// `capacity` counts pixels and `layers` counts interleaved channels, so
/// the backing store holds `capacity * layers` floats. Each buffer
/// carries a process-unique id so reuse can be verified by identity
/// rather than contents.
pub struct PixelBuffer {
    id: u64,
    shape: BufferShape,
    data: Vec<f32>,
}

impl PixelBuffer {
    /// Allocates a zeroed buffer of the given shape.
    pub fn new(shape: BufferShape) -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            shape,
            data: vec![0.0; shape.elements()],
        }
    }

    /// Process-unique identity of this allocation.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Shape this buffer was allocated with.
    #[inline]
    pub fn shape(&self) -> BufferShape {
        self.shape
    }

    /// Interleaved pixel data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable interleaved pixel data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Zeroes the payload.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }
}

/// Builds the pool every pixel-buffer consumer in the stage shares.
pub fn pixel_buffer_pool() -> BufferPool<PixelBuffer> {
    BufferPool::new(PixelBuffer::new)
}
