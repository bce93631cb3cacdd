//! The provider capability trait.

use std::fmt;

use upscale_core::{FrameSize, ProviderKind, SuperResParams};
use upscale_gpu::{BufferPool, PixelBuffer, Texture};

use crate::ProviderResult;

/// Everything an engine needs at load time.
#[derive(Clone)]
pub struct LoadContext {
    /// Shared buffer pool engines allocate their outputs from.
    pub pool: BufferPool<PixelBuffer>,
}

impl LoadContext {
    /// Creates a load context over the stage's shared pool.
    pub fn new(pool: BufferPool<PixelBuffer>) -> Self {
        Self { pool }
    }
}

/// One loaded upscaling provider.
///
/// Construction is the load step and returns `Err` when the backend
/// cannot come up; dropping the engine is the unload step. Engines know
/// nothing about switch scheduling or the render loop; they are pure
/// frame transformers.
pub trait UpscaleEngine: Send {
    /// Which provider this engine implements.
    fn kind(&self) -> ProviderKind;

    /// Applies tuning parameters. Called after load and again whenever
    /// the host configuration changes while the engine is active.
    fn configure(&mut self, params: &SuperResParams) -> ProviderResult<()>;

    /// The output size this engine would produce for `input`.
    ///
    /// Never returns a zero dimension for any input.
    fn output_size(&self, input: FrameSize) -> FrameSize;

    /// Processes one captured frame.
    ///
    /// `Err` signals a per-frame failure the caller degrades to a skipped
    /// tick. `Ok(None)` means the engine produced no output at all, which
    /// callers treat as a contract violation; a healthy engine always
    /// returns `Ok(Some(_))`.
    fn process(&mut self, input: &Texture) -> ProviderResult<Option<Texture>>;
}

impl fmt::Debug for dyn UpscaleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UpscaleEngine").field(&self.kind()).finish()
    }
}
