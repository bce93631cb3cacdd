//! GPU-side buffer management for the upscaling filter stage.
//!
//! Provides the shape-keyed buffer pool that lets the render path reuse
//! fixed-shape buffer objects across frames instead of allocating every
//! tick, plus the shared texture and capture-target types built on it.
//!
//! # Architecture
//!
//! ```text
//! CaptureTarget (owned per filter instance)
//!     └── Texture (shared, cheap to clone)
//!             └── Pooled<PixelBuffer> (ref-counted checkout handle)
//!                     └── BufferPool<PixelBuffer> (shape-keyed idle lists)
//! ```
//!
//! The pool is generic: any renderer-facing component with fixed-shape
//! objects can reuse it.

pub mod buffer;
pub mod capture;
pub mod pool;
pub mod texture;

pub use buffer::{pixel_buffer_pool, PixelBuffer};
pub use capture::{CapturePass, CaptureTarget, FrameSource, RenderState};
pub use pool::{BufferPool, BufferShape, Pooled};
pub use texture::{Texture, CHANNELS};

use thiserror::Error;

/// Buffer and capture errors.
#[derive(Debug, Error)]
pub enum GpuError {
    /// A capture or texture was requested with a zero dimension.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Pixel data length does not match the declared shape.
    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch {
        /// Elements implied by the shape.
        expected: usize,
        /// Elements supplied.
        actual: usize,
    },
}

/// Result alias for buffer and capture operations.
pub type GpuResult<T> = std::result::Result<T, GpuError>;
