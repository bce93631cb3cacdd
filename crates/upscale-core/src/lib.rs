//! # upscale-core
//!
//! Core types for the real-time upscaling filter stage.
//!
//! This crate provides the shared vocabulary used throughout the
//! upscale-rs workspace:
//!
//! - [`FrameSize`] - Video frame dimensions with non-zero clamping
//! - [`ProviderKind`], [`ProviderSelection`] - Provider identity and the
//!   automatic-selection sentinel
//! - [`SuperResParams`], [`Strength`] - Per-provider tuning parameters
//! - [`FilterConfig`] - The host-persisted configuration blob, with its
//!   versioned migration hook
//!
//! ## Crate Structure
//!
//! This crate is the foundation of the workspace and has no internal
//! dependencies. All other upscale-rs crates depend on `upscale-core`:
//!
//! ```text
//! upscale-core (this crate)
//!    ^
//!    |
//!    +-- upscale-gpu (buffer pool, textures, capture)
//!    +-- upscale-providers (engines, registry)
//!    +-- upscale-filter (filter instance, host surface)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod provider;
pub mod size;

pub use config::{
    FilterConfig, Strength, SuperResParams, CONFIG_VERSION, SCALE_PERCENT_DEFAULT,
    SCALE_PERCENT_MAX, SCALE_PERCENT_MIN,
};
pub use provider::{ProviderKind, ProviderSelection};
pub use size::FrameSize;
