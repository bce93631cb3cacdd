//! Host-persisted filter configuration.
//!
//! The host serializes [`FilterConfig`] with its own mechanism (hence the
//! serde derives); this crate only defines the fields and their defaults.

use serde::{Deserialize, Serialize};

use crate::provider::ProviderSelection;

/// Current configuration schema version, passed to [`FilterConfig::migrate`]
/// by hosts that persist the version alongside the blob.
pub const CONFIG_VERSION: u64 = 1;

/// Minimum scale factor, in percent.
pub const SCALE_PERCENT_MIN: f64 = 100.0;
/// Maximum scale factor, in percent.
pub const SCALE_PERCENT_MAX: f64 = 400.0;
/// Default scale factor, in percent.
pub const SCALE_PERCENT_DEFAULT: f64 = 150.0;

/// Strength class of the upscaling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strength {
    /// Softer reconstruction, fewer artifacts.
    #[default]
    Weak,
    /// Sharper reconstruction.
    Strong,
}

impl Strength {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Strong => "strong",
        }
    }
}

/// Tuning parameters forwarded to the active provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuperResParams {
    /// Strength class of the reconstruction.
    pub strength: Strength,
    /// Scale factor as a percentage of the input size, in
    /// [`SCALE_PERCENT_MIN`]..=[`SCALE_PERCENT_MAX`].
    pub scale_percent: f64,
}

impl Default for SuperResParams {
    fn default() -> Self {
        Self {
            strength: Strength::default(),
            scale_percent: SCALE_PERCENT_DEFAULT,
        }
    }
}

impl SuperResParams {
    /// Returns a copy with `scale_percent` clamped into the valid range.
    ///
    /// Out-of-range values coming from a hand-edited config are clamped
    /// rather than rejected; the stage keeps running.
    pub fn sanitized(self) -> Self {
        Self {
            strength: self.strength,
            scale_percent: self.scale_percent.clamp(SCALE_PERCENT_MIN, SCALE_PERCENT_MAX),
        }
    }

    /// The scale factor as a plain multiplier (1.0..=4.0).
    #[inline]
    pub fn scale_factor(&self) -> f32 {
        (self.scale_percent.clamp(SCALE_PERCENT_MIN, SCALE_PERCENT_MAX) / 100.0) as f32
    }
}

/// Everything the host persists for one filter attachment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Which provider to use.
    pub provider: ProviderSelection,
    /// Provider tuning parameters.
    pub superres: SuperResParams,
}

impl FilterConfig {
    /// Upgrades a configuration persisted by an older build.
    ///
    /// Currently a no-op: version 1 is the first schema. The hook must
    /// stay callable so hosts can invoke it unconditionally on load.
    pub fn migrate(&mut self, _from_version: u64) {}
}
