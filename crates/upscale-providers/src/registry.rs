//! Provider registry: probe-once availability and automatic selection.
//!
//! The registry is constructed explicitly at startup and passed by
//! reference into every filter instance; there is no process-wide
//! singleton. Availability is decided once, by best-effort initialization
//! of each compiled-in backend, and never re-probed: an accelerator that
//! disappears mid-session keeps its availability flag and simply starts
//! failing per-frame, which the render path already degrades gracefully.

use std::sync::Arc;

use tracing::debug;
use upscale_core::{ProviderKind, ProviderSelection};

use crate::cpu::CpuSuperRes;
use crate::engine::{LoadContext, UpscaleEngine};
use crate::{ProviderError, ProviderResult};

/// Constructs an engine for one provider.
pub type EngineLoader =
    Arc<dyn Fn(&LoadContext) -> ProviderResult<Box<dyn UpscaleEngine>> + Send + Sync>;

/// One provider known to the registry.
pub struct ProviderEntry {
    kind: ProviderKind,
    available: bool,
    priority: u32,
    loader: EngineLoader,
}

impl ProviderEntry {
    /// Creates a registry entry.
    ///
    /// Higher `priority` wins automatic selection. Integration tests use
    /// this to register scripted engines under the compiled-in kinds.
    pub fn new(
        kind: ProviderKind,
        available: bool,
        priority: u32,
        loader: impl Fn(&LoadContext) -> ProviderResult<Box<dyn UpscaleEngine>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            available,
            priority,
            loader: Arc::new(loader),
        }
    }

    /// Provider this entry describes.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Whether the provider initialized on this machine.
    pub fn available(&self) -> bool {
        self.available
    }
}

/// Catalog of compiled-in providers and their availability.
pub struct ProviderRegistry {
    /// Sorted by descending priority; ties keep insertion order.
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    /// Probes every compiled-in provider once and records the outcome.
    ///
    /// A provider whose backend fails to initialize is marked permanently
    /// unavailable for this registry's lifetime; there are no retries.
    pub fn probe() -> Self {
        let mut entries = Vec::new();

        #[cfg(feature = "wgpu")]
        {
            let available = crate::wgpu_engine::WgpuSuperRes::is_available();
            if !available {
                tracing::warn!("wgpu super-resolution unavailable: no suitable adapter");
            }
            entries.push(ProviderEntry::new(
                ProviderKind::WgpuSuperRes,
                available,
                100,
                |ctx| {
                    crate::wgpu_engine::WgpuSuperRes::load(ctx)
                        .map(|e| Box::new(e) as Box<dyn UpscaleEngine>)
                },
            ));
        }

        entries.push(ProviderEntry::new(
            ProviderKind::CpuSuperRes,
            true,
            10,
            |ctx| CpuSuperRes::load(ctx).map(|e| Box::new(e) as Box<dyn UpscaleEngine>),
        ));

        let registry = Self::from_entries(entries);
        debug!("provider probe complete:\n{}", registry.describe());
        registry
    }

    /// Builds a registry from explicit entries.
    pub fn from_entries(mut entries: Vec<ProviderEntry>) -> Self {
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { entries }
    }

    /// Whether `kind` initialized successfully on this machine.
    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == kind && entry.available)
    }

    /// Whether any provider at all is usable. When this is false the
    /// whole feature is disabled and the stage is not offered to the
    /// host.
    pub fn any_available(&self) -> bool {
        self.entries.iter().any(|entry| entry.available)
    }

    /// Walks the priority order and returns the first available provider,
    /// or `None` when nothing initialized. Callers must treat `None` as
    /// "leave current state unchanged", never as a valid provider.
    pub fn find_ideal(&self) -> Option<ProviderKind> {
        self.entries
            .iter()
            .find(|entry| entry.available)
            .map(|entry| entry.kind)
    }

    /// Resolves a user selection to a concrete provider.
    ///
    /// An exact selection the registry reports unavailable resolves to
    /// `None`; the caller leaves the active provider unchanged rather
    /// than falling back to automatic selection.
    pub fn resolve(&self, selection: ProviderSelection) -> Option<ProviderKind> {
        match selection {
            ProviderSelection::Automatic => self.find_ideal(),
            ProviderSelection::Exact(kind) => {
                if self.is_available(kind) {
                    Some(kind)
                } else {
                    debug!("selected provider '{kind}' is unavailable, keeping current");
                    None
                }
            }
        }
    }

    /// Providers known to this registry, best first.
    pub fn kinds(&self) -> impl Iterator<Item = ProviderKind> + '_ {
        self.entries.iter().map(|entry| entry.kind)
    }

    /// Loads an engine for `kind`.
    pub fn load(&self, kind: ProviderKind, ctx: &LoadContext) -> ProviderResult<Box<dyn UpscaleEngine>> {
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.kind == kind)
            .ok_or(ProviderError::Unavailable(kind))?;
        if !entry.available {
            return Err(ProviderError::Unavailable(kind));
        }
        (entry.loader)(ctx)
    }

    /// One line per provider, `+` available / `-` unavailable.
    pub fn describe(&self) -> String {
        let mut desc = String::new();
        for entry in &self.entries {
            let status = if entry.available { "+" } else { "-" };
            desc.push_str(&format!(
                "[{}] {} (priority {})\n",
                status, entry.kind, entry.priority
            ));
        }
        desc
    }
}
