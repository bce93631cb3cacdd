//! Per-attachment filter instance.
//!
//! Owns one capture buffer and one active provider engine, and drives
//! the per-tick capture → process → composite pipeline. Provider
//! switches run on the background scheduler; the switch slot mutex is
//! the single point of truth for provider identity and the engine
//! object, and the readiness flag is written only by the switch task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info};

use upscale_core::{FilterConfig, FrameSize, ProviderKind, SuperResParams};
use upscale_gpu::{
    BufferPool, CaptureTarget, FrameSource, GpuResult, PixelBuffer, Texture, CHANNELS,
};
use upscale_providers::{LoadContext, ProviderRegistry, UpscaleEngine};

use crate::taskpool::{TaskHandle, TaskPool};

/// What the stage handed downstream this tick.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    /// The stage was transparent: downstream consumes the unmodified
    /// upstream frame, and this stage did no GPU work.
    Bypassed,
    /// The processed (or cached) output texture.
    Rendered(Texture),
}

impl RenderOutcome {
    /// Whether this tick bypassed the stage.
    pub fn is_bypassed(&self) -> bool {
        matches!(self, Self::Bypassed)
    }
}

/// Snapshot handed to one switch task.
struct SwitchJob {
    previous: Option<ProviderKind>,
    target: ProviderKind,
    generation: u64,
}

/// State guarded by the instance mutex.
struct ProviderSlot {
    /// Identity of the provider this instance is (or is becoming).
    active: Option<ProviderKind>,
    /// The loaded engine; `None` while unloaded, loading or failed.
    engine: Option<Box<dyn UpscaleEngine>>,
    /// Last known configuration, applied at load time.
    params: SuperResParams,
    /// Bumped per switch request; a task seeing a newer generation
    /// discards its own completion.
    generation: u64,
}

struct SwitchShared {
    slot: Mutex<ProviderSlot>,
    /// False for the entire duration a switch is in flight; written only
    /// by the switch task.
    ready: AtomicBool,
}

/// One attachment of the upscaling stage.
pub struct FilterInstance {
    registry: Arc<ProviderRegistry>,
    scheduler: Arc<TaskPool>,
    pool: BufferPool<PixelBuffer>,
    shared: Arc<SwitchShared>,

    selected: Option<ProviderKind>,
    in_size: FrameSize,
    out_size: FrameSize,
    input: CaptureTarget,
    output: Option<Texture>,
    dirty: bool,
    task: Option<TaskHandle>,
}

impl FilterInstance {
    /// Creates an instance and applies the initial configuration.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        scheduler: Arc<TaskPool>,
        pool: BufferPool<PixelBuffer>,
        config: &FilterConfig,
    ) -> Self {
        let input = CaptureTarget::new(&pool);
        let mut instance = Self {
            registry,
            scheduler,
            pool,
            shared: Arc::new(SwitchShared {
                slot: Mutex::new(ProviderSlot {
                    active: None,
                    engine: None,
                    params: config.superres.sanitized(),
                    generation: 0,
                }),
                ready: AtomicBool::new(false),
            }),
            selected: None,
            in_size: FrameSize::new(1, 1),
            out_size: FrameSize::new(1, 1),
            input,
            output: None,
            dirty: false,
            task: None,
        };
        instance.update(config);
        instance
    }

    /// Applies a configuration change from the host.
    ///
    /// Resolves the provider selection (automatic goes through the
    /// registry's priority rule), triggers a switch when the resolved
    /// provider differs from the active one, and forwards the tuning
    /// parameters to a ready engine. An unresolvable selection (nothing
    /// available, or an explicitly chosen provider that never
    /// initialized) leaves the current state unchanged.
    pub fn update(&mut self, config: &FilterConfig) {
        let params = config.superres.sanitized();
        {
            let mut slot = self.shared.slot.lock().unwrap();
            slot.params = params;
        }

        if let Some(target) = self.registry.resolve(config.provider) {
            self.selected = Some(target);
            self.switch_provider(target);
        }

        if self.is_ready() && !self.switch_in_flight() {
            let mut slot = self.shared.slot.lock().unwrap();
            if let Some(engine) = slot.engine.as_mut() {
                if let Err(err) = engine.configure(&params) {
                    error!("failed to apply configuration: {err}");
                }
            }
        }
    }

    /// Requests a switch to `target`.
    ///
    /// A no-op when `target` is already the active provider. Otherwise
    /// the previous task is dequeued if still pending (a running one is
    /// waited out), the target becomes the instance's provider identity
    /// immediately so rapid requests coalesce, and the swap itself is
    /// enqueued on the background scheduler.
    pub fn switch_provider(&mut self, target: ProviderKind) {
        {
            let slot = self.shared.slot.lock().unwrap();
            if slot.active == Some(target) {
                return;
            }
        }

        // At most one task in flight: dequeue a pending one, wait out a
        // running one. Must not hold the slot lock here, the running
        // task owns it.
        if let Some(task) = self.task.take() {
            task.cancel_if_queued();
            task.wait();
        }

        let job = {
            let mut slot = self.shared.slot.lock().unwrap();
            if slot.active == Some(target) {
                return;
            }
            slot.generation += 1;
            let previous = slot.active.replace(target);
            SwitchJob {
                previous,
                target,
                generation: slot.generation,
            }
        };

        info!(
            "switching provider from '{}' to '{}'",
            job.previous.map(|k| k.name()).unwrap_or("none"),
            job.target
        );

        let shared = Arc::clone(&self.shared);
        let registry = Arc::clone(&self.registry);
        let pool = self.pool.clone();
        self.task = Some(
            self.scheduler
                .push(move || run_switch(&shared, &registry, pool, &job)),
        );
    }

    /// Records the upstream size for this tick and recomputes the output
    /// size. Marks the frame dirty unconditionally: content may have
    /// changed upstream even when the size did not.
    pub fn video_tick(&mut self, source_size: FrameSize) {
        self.in_size = source_size;
        self.out_size = source_size;

        if self.is_ready() {
            let slot = self.shared.slot.lock().unwrap();
            if let Some(engine) = slot.engine.as_ref() {
                self.out_size = engine.output_size(self.in_size);
            }
        }

        self.dirty = true;
    }

    /// Runs the capture → process → composite pipeline for this tick.
    ///
    /// With no ready provider, no upstream source or an empty frame the
    /// stage is fully transparent. While dirty, the upstream frame is
    /// recaptured and reprocessed; failures skip the tick and leave the
    /// frame dirty so the next tick retries from a fresh capture. The
    /// cached output is drawn every non-bypassed tick.
    pub fn video_render(&mut self, source: Option<&mut dyn FrameSource>) -> RenderOutcome {
        let Some(source) = source else {
            return RenderOutcome::Bypassed;
        };
        if !self.is_ready() || self.in_size.is_empty() {
            return RenderOutcome::Bypassed;
        }

        if self.dirty {
            // Capture the incoming frame into the owned buffer.
            match self.input.begin(self.in_size) {
                Ok(mut pass) => source.render(&mut pass),
                Err(err) => {
                    debug!("capture failed: {err}");
                    return RenderOutcome::Bypassed;
                }
            }
            let captured = self.input.texture();

            // Process under the slot lock so the engine cannot be
            // swapped out mid-frame.
            let processed = {
                let mut slot = self.shared.slot.lock().unwrap();
                match slot.engine.as_mut() {
                    Some(engine) => engine.process(&captured),
                    None => Ok(None),
                }
            };

            match processed {
                Ok(Some(result)) => {
                    match compose_restore_alpha(&self.pool, &result, &captured) {
                        Ok(output) => {
                            self.output = Some(output);
                            self.dirty = false;
                        }
                        Err(err) => {
                            error!("failed to composite output: {err}");
                            return RenderOutcome::Bypassed;
                        }
                    }
                }
                Ok(None) => {
                    error!(
                        "provider '{}' did not return a result",
                        self.selected.map(|k| k.name()).unwrap_or("none")
                    );
                    return RenderOutcome::Bypassed;
                }
                Err(err) => {
                    debug!("processing failed, skipping tick: {err}");
                    return RenderOutcome::Bypassed;
                }
            }
        }

        match &self.output {
            Some(texture) => RenderOutcome::Rendered(texture.clone()),
            None => RenderOutcome::Bypassed,
        }
    }

    /// Output size reported to the host; never zero in either dimension.
    pub fn output_size(&self) -> FrameSize {
        self.out_size.clamped_nonzero()
    }

    /// Input size recorded by the last tick.
    pub fn input_size(&self) -> FrameSize {
        self.in_size
    }

    /// Whether the active provider finished loading and may process
    /// frames this tick.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    /// Whether a queued or running switch task exists.
    pub fn switch_in_flight(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_settled())
    }

    /// Blocks until any in-flight switch settles. Hosts call this before
    /// tearing the instance down; destruction does it implicitly.
    pub fn complete_pending_switch(&self) {
        if let Some(task) = &self.task {
            task.wait();
        }
    }

    /// Identity of the provider this instance is (or is becoming).
    pub fn active_provider(&self) -> Option<ProviderKind> {
        self.shared.slot.lock().unwrap().active
    }

    /// The provider the UI shows as selected.
    pub fn selected_provider(&self) -> Option<ProviderKind> {
        self.selected
    }

    /// Whether the cached output is stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Drop for FilterInstance {
    fn drop(&mut self) {
        // Dequeue a pending switch, wait out a running one, then unload
        // synchronously: no GPU resource may die while a task uses it.
        if let Some(task) = self.task.take() {
            task.cancel_if_queued();
            task.wait();
        }
        let mut slot = self.shared.slot.lock().unwrap();
        slot.engine = None;
    }
}

/// Switch task body; runs on a scheduler worker.
fn run_switch(
    shared: &SwitchShared,
    registry: &ProviderRegistry,
    pool: BufferPool<PixelBuffer>,
    job: &SwitchJob,
) {
    // 1. The instance is not ready for the whole swap.
    shared.ready.store(false, Ordering::SeqCst);

    // 2. Hold the slot for the full unload/load/configure sequence so
    //    render calls observe a consistent not-ready state.
    let mut slot = shared.slot.lock().unwrap();

    if slot.generation != job.generation {
        debug!("switch to '{}' superseded, discarding", job.target);
        return;
    }

    // 3. Unload the previous engine strictly before the new one loads.
    slot.engine = None;

    // 4. Load and configure the target.
    let ctx = LoadContext::new(pool);
    match registry.load(job.target, &ctx) {
        Ok(mut engine) => {
            let params = slot.params;
            if let Err(err) = engine.configure(&params) {
                error!("failed to configure provider '{}': {err}", job.target);
                return;
            }
            slot.engine = Some(engine);
            // 5. Both steps succeeded; the instance becomes ready.
            shared.ready.store(true, Ordering::SeqCst);
            info!(
                "switched provider from '{}' to '{}'",
                job.previous.map(|k| k.name()).unwrap_or("none"),
                job.target
            );
        }
        Err(err) => {
            error!("failed switching provider to '{}': {err}", job.target);
        }
    }
}

/// Draws the processed frame with the original capture's alpha channel
/// restored, nearest-sampling the capture when the sizes differ.
fn compose_restore_alpha(
    pool: &BufferPool<PixelBuffer>,
    processed: &Texture,
    captured: &Texture,
) -> GpuResult<Texture> {
    let size = processed.size();
    let cap_size = captured.size();
    let mut pixels = processed.data().to_vec();

    if !size.is_empty() && !cap_size.is_empty() {
        let ch = CHANNELS as usize;
        for y in 0..size.height {
            let sy = (y as u64 * cap_size.height as u64 / size.height as u64) as u32;
            for x in 0..size.width {
                let sx = (x as u64 * cap_size.width as u64 / size.width as u64) as u32;
                if let Some(src) = captured.pixel(sx, sy) {
                    let idx = (y as usize * size.width as usize + x as usize) * ch;
                    pixels[idx + 3] = src[3];
                }
            }
        }
    }

    Texture::from_pixels(pool, size, &pixels)
}
