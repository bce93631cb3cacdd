//! Upscaling provider engines and their registry.
//!
//! A *provider* is one accelerated upscaling implementation hidden behind
//! the [`UpscaleEngine`] trait: construction is the fallible load step,
//! `Drop` is unload, and `configure`/`output_size`/`process` cover the
//! per-instance contract. The [`ProviderRegistry`] probes every
//! compiled-in provider once at startup and answers availability and
//! automatic-selection queries for the rest of the process lifetime.
//!
//! # Providers
//!
//! ```text
//! ProviderRegistry (probe once, fixed priority)
//!     +-- WgpuSuperRes  (feature "wgpu": compute shaders)
//!     +-- CpuSuperRes   (always compiled: rayon resampling)
//! ```

pub mod cpu;
pub mod engine;
pub mod registry;

#[cfg(feature = "wgpu")]
mod shaders;
#[cfg(feature = "wgpu")]
pub mod wgpu_engine;

pub use cpu::CpuSuperRes;
pub use engine::{LoadContext, UpscaleEngine};
pub use registry::{EngineLoader, ProviderEntry, ProviderRegistry};

#[cfg(feature = "wgpu")]
pub use wgpu_engine::WgpuSuperRes;

use thiserror::Error;
use upscale_core::ProviderKind;
use upscale_gpu::GpuError;

/// Provider operation errors.
///
/// Everything here is recoverable at the filter level: a load failure
/// leaves the instance not-ready, a process failure skips one tick.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No suitable GPU adapter was found.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The provider did not initialize on this machine.
    #[error("provider '{0}' is not available")]
    Unavailable(ProviderKind),

    /// Device creation failed after a successful adapter probe.
    #[error("failed to create device: {0}")]
    DeviceCreation(String),

    /// Compute shader compilation failed.
    #[error("failed to compile shader: {0}")]
    ShaderCompilation(String),

    /// Loading the provider failed.
    #[error("failed to load provider '{provider}': {reason}")]
    LoadFailed {
        /// Provider that failed to load.
        provider: ProviderKind,
        /// Failure description.
        reason: String,
    },

    /// Per-frame processing failed.
    #[error("processing failed: {0}")]
    ProcessFailed(String),

    /// Buffer-level failure surfaced from the GPU layer.
    #[error(transparent)]
    Gpu(#[from] GpuError),
}

impl ProviderError {
    /// Creates a [`ProviderError::LoadFailed`].
    pub fn load_failed(provider: ProviderKind, reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            provider,
            reason: reason.into(),
        }
    }

    /// Creates a [`ProviderError::ProcessFailed`].
    pub fn process(reason: impl Into<String>) -> Self {
        Self::ProcessFailed(reason.into())
    }

    /// Returns `true` for availability failures (adapter/unavailable).
    pub fn is_availability(&self) -> bool {
        matches!(self, Self::NoAdapter | Self::Unavailable(_))
    }
}

/// Result alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
