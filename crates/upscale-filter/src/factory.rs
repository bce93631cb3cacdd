//! Host-facing factory for the upscaling stage.
//!
//! One factory exists per host process. It owns the provider registry,
//! the background switch scheduler and the shared buffer pool, and it is
//! the gate that disables the whole feature when no provider initialized
//! on this machine.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use upscale_core::FilterConfig;
use upscale_gpu::{pixel_buffer_pool, BufferPool, PixelBuffer};
use upscale_providers::ProviderRegistry;

use crate::instance::FilterInstance;
use crate::properties::{superres_properties, Property, KEY_PROVIDER};
use crate::taskpool::TaskPool;

/// Worker threads for provider switches. Switches are rare, so the pool
/// stays small.
const SWITCH_WORKERS: usize = 2;

/// Factory for filter instances.
pub struct FilterFactory {
    registry: Arc<ProviderRegistry>,
    scheduler: Arc<TaskPool>,
    pool: BufferPool<PixelBuffer>,
}

impl FilterFactory {
    /// Probes the compiled-in providers and builds the factory.
    ///
    /// Returns `None` when no provider initialized: the stage must not
    /// be offered to the host at all in that case.
    pub fn new() -> Option<Self> {
        Self::with_registry(Arc::new(ProviderRegistry::probe()))
    }

    /// Builds the factory over an explicitly constructed registry.
    pub fn with_registry(registry: Arc<ProviderRegistry>) -> Option<Self> {
        if !registry.any_available() {
            error!("all upscaling providers failed to initialize, disabling the stage");
            return None;
        }
        Some(Self {
            registry,
            scheduler: Arc::new(TaskPool::new(SWITCH_WORKERS)),
            pool: pixel_buffer_pool(),
        })
    }

    /// Creates one filter attachment.
    pub fn create(&self, config: &FilterConfig) -> FilterInstance {
        FilterInstance::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.scheduler),
            self.pool.clone(),
            config,
        )
    }

    /// Default configuration for new attachments.
    pub fn defaults() -> FilterConfig {
        FilterConfig::default()
    }

    /// The provider registry backing this factory.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The shared buffer pool.
    pub fn pool(&self) -> &BufferPool<PixelBuffer> {
        &self.pool
    }

    /// Periodic maintenance hook: evicts pool buffers idle longer than
    /// `max_idle`. The host calls this from its own timer; the pool runs
    /// no threads of its own.
    pub fn maintain(&self, max_idle: Duration) {
        self.pool.cleanup(max_idle);
    }

    /// Property schema for the host's panel.
    ///
    /// Always contains the provider selector; the per-provider parameter
    /// group is appended when the instance has a provider selected.
    pub fn properties(&self, instance: Option<&FilterInstance>) -> Vec<Property> {
        let mut options = vec![("automatic".to_string(), "Automatic".to_string())];
        for kind in self.registry.kinds() {
            options.push((kind.name().to_string(), kind.name().to_string()));
        }

        let mut properties = vec![Property::Select {
            key: KEY_PROVIDER,
            label: "Provider",
            options,
        }];

        if instance.is_some_and(|i| i.selected_provider().is_some()) {
            properties.extend(superres_properties());
        }

        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upscale_core::ProviderKind;
    use upscale_providers::{ProviderEntry, ProviderError, ProviderRegistry};

    fn dead_registry() -> Arc<ProviderRegistry> {
        Arc::new(ProviderRegistry::from_entries(vec![ProviderEntry::new(
            ProviderKind::CpuSuperRes,
            false,
            10,
            |_| Err(ProviderError::Unavailable(ProviderKind::CpuSuperRes)),
        )]))
    }

    #[test]
    fn test_no_providers_disables_the_stage() {
        assert!(FilterFactory::with_registry(dead_registry()).is_none());
    }

    #[test]
    fn test_probe_factory_creates_instances() {
        let factory = FilterFactory::new().expect("cpu provider is always available");
        let instance = factory.create(&FilterFactory::defaults());
        instance.complete_pending_switch();
        assert_eq!(
            instance.active_provider(),
            factory.registry().find_ideal()
        );
    }

    #[test]
    fn test_properties_schema() {
        let factory = FilterFactory::new().expect("cpu provider is always available");
        let instance = factory.create(&FilterFactory::defaults());

        let props = factory.properties(Some(&instance));
        assert!(matches!(&props[0], Property::Select { key, .. } if *key == KEY_PROVIDER));
        // Selector plus the provider parameter group.
        assert_eq!(props.len(), 3);

        let bare = factory.properties(None);
        assert_eq!(bare.len(), 1);
    }
}
