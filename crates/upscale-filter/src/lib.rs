//! Per-attachment upscaling filter stage.
//!
//! A [`FilterInstance`] sits in a host's filter chain and, every tick,
//! captures the upstream frame, runs it through the active upscaling
//! provider and serves the processed texture downstream. Provider
//! switches happen on a background [`TaskPool`] worker so the render
//! thread never waits for a backend to load.
//!
//! # Architecture
//!
//! ```text
//! FilterFactory (registry + scheduler + pool, one per host)
//!     └── FilterInstance (one per attachment)
//!             +-- CaptureTarget (owned input buffer)
//!             +-- switch slot (mutex: active kind + engine)
//!             +-- TaskHandle (at most one in-flight switch)
//! ```

pub mod factory;
pub mod instance;
pub mod properties;
pub mod taskpool;

pub use factory::FilterFactory;
pub use instance::{FilterInstance, RenderOutcome};
pub use properties::Property;
pub use taskpool::{TaskHandle, TaskPool, TaskState};
