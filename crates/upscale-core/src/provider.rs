//! Provider identity and selection.

use serde::{Deserialize, Serialize};

/// Identifies a compiled-in upscaling provider.
///
/// Whether a provider actually initialized on this machine is a separate
/// question answered by the registry in `upscale-providers`; this enum is
/// just the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// CPU super-sampling (rayon-parallel resampling).
    CpuSuperRes,
    /// GPU super-resolution via wgpu compute shaders.
    WgpuSuperRes,
}

impl ProviderKind {
    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CpuSuperRes => "cpu-superres",
            Self::WgpuSuperRes => "wgpu-superres",
        }
    }

    /// All provider kinds known to this build.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::WgpuSuperRes, Self::CpuSuperRes]
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The provider the user asked for.
///
/// `Automatic` resolves through the registry's priority rule at update
/// time; `Exact` pins a specific provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProviderSelection {
    /// Pick the best available provider.
    #[default]
    Automatic,
    /// Use exactly this provider.
    Exact(ProviderKind),
}

impl std::fmt::Display for ProviderSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => f.write_str("automatic"),
            Self::Exact(kind) => kind.fmt(f),
        }
    }
}
