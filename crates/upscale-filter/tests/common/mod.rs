//! Shared scaffolding for the filter integration tests: scripted
//! provider engines with observable lifecycle events, and synthetic
//! upstream frame sources.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use upscale_core::{
    FilterConfig, FrameSize, ProviderKind, ProviderSelection, SuperResParams,
};
use upscale_gpu::{BufferPool, CapturePass, FrameSource, PixelBuffer, Texture, CHANNELS};
use upscale_providers::{
    LoadContext, ProviderEntry, ProviderError, ProviderRegistry, UpscaleEngine,
};

/// Observable lifecycle events recorded by scripted engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    LoadAttempted(ProviderKind),
    Loaded(ProviderKind),
    Configured(ProviderKind),
    Processed(ProviderKind),
    Unloaded(ProviderKind),
}

/// Thread-safe event log shared between engines and assertions.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: Event) -> usize {
        self.snapshot().iter().filter(|&&e| e == event).count()
    }

    /// Index of the first occurrence of `event`.
    pub fn position(&self, event: Event) -> Option<usize> {
        self.snapshot().iter().position(|&e| e == event)
    }
}

/// Behavior knobs for one scripted provider.
#[derive(Clone, Default)]
pub struct Script {
    /// Fail this many load attempts before succeeding.
    pub load_failures: Arc<AtomicUsize>,
    /// Fail this many process calls before succeeding.
    pub process_failures: Arc<AtomicUsize>,
    /// Return `Ok(None)` from this many process calls.
    pub empty_results: Arc<AtomicUsize>,
    /// Artificial delay inside load, for in-flight observations.
    pub load_delay_ms: Arc<AtomicUsize>,
    /// Peak number of concurrent load calls observed.
    pub max_loads_in_flight: Arc<AtomicUsize>,
    loads_in_flight: Arc<AtomicUsize>,
}

/// Decrements `counter` if positive; returns whether it was consumed.
fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
        .is_ok()
}

/// Scripted engine: deterministic output, scripted failures, recorded
/// lifecycle.
pub struct ScriptedEngine {
    kind: ProviderKind,
    recorder: Recorder,
    script: Script,
    pool: BufferPool<PixelBuffer>,
    params: SuperResParams,
}

impl UpscaleEngine for ScriptedEngine {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn configure(&mut self, params: &SuperResParams) -> upscale_providers::ProviderResult<()> {
        self.recorder.push(Event::Configured(self.kind));
        self.params = params.sanitized();
        Ok(())
    }

    fn output_size(&self, input: FrameSize) -> FrameSize {
        input.scaled(self.params.scale_factor())
    }

    fn process(&mut self, input: &Texture) -> upscale_providers::ProviderResult<Option<Texture>> {
        if take_one(&self.script.process_failures) {
            return Err(ProviderError::process("scripted process failure"));
        }
        if take_one(&self.script.empty_results) {
            return Ok(None);
        }
        self.recorder.push(Event::Processed(self.kind));

        // Output: the input's top-left color over the whole scaled frame,
        // with alpha forced opaque so restore-alpha is observable.
        let out_size = self.output_size(input.size());
        let base = input.pixel(0, 0).unwrap_or([0.0; 4]);
        let pixel = [base[0], base[1], base[2], 1.0];
        let data: Vec<f32> = pixel
            .iter()
            .copied()
            .cycle()
            .take(out_size.pixels() as usize * CHANNELS as usize)
            .collect();
        let texture = Texture::from_pixels(&self.pool, out_size, &data)?;
        Ok(Some(texture))
    }
}

impl Drop for ScriptedEngine {
    fn drop(&mut self) {
        self.recorder.push(Event::Unloaded(self.kind));
    }
}

/// Builds a registry of scripted providers.
///
/// Returns the registry, the shared event log, and the per-provider
/// behavior scripts.
pub fn scripted_registry(
    kinds: &[(ProviderKind, bool, u32)],
) -> (Arc<ProviderRegistry>, Recorder, HashMap<ProviderKind, Script>) {
    let recorder = Recorder::default();
    let mut scripts = HashMap::new();

    let entries = kinds
        .iter()
        .map(|&(kind, available, priority)| {
            let script = Script::default();
            scripts.insert(kind, script.clone());
            let recorder = recorder.clone();

            ProviderEntry::new(kind, available, priority, move |ctx: &LoadContext| {
                recorder.push(Event::LoadAttempted(kind));

                let in_flight = script.loads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                script.max_loads_in_flight.fetch_max(in_flight, Ordering::SeqCst);

                let delay = script.load_delay_ms.load(Ordering::SeqCst);
                if delay > 0 {
                    std::thread::sleep(Duration::from_millis(delay as u64));
                }

                let result = if take_one(&script.load_failures) {
                    Err(ProviderError::load_failed(kind, "scripted load failure"))
                } else {
                    recorder.push(Event::Loaded(kind));
                    Ok(Box::new(ScriptedEngine {
                        kind,
                        recorder: recorder.clone(),
                        script: script.clone(),
                        pool: ctx.pool.clone(),
                        params: SuperResParams::default(),
                    }) as Box<dyn UpscaleEngine>)
                };

                script.loads_in_flight.fetch_sub(1, Ordering::SeqCst);
                result
            })
        })
        .collect();

    (
        Arc::new(ProviderRegistry::from_entries(entries)),
        recorder,
        scripts,
    )
}

/// Configuration selecting `kind` exactly, at the given scale.
pub fn exact_config(kind: ProviderKind, scale_percent: f64) -> FilterConfig {
    FilterConfig {
        provider: ProviderSelection::Exact(kind),
        superres: SuperResParams {
            scale_percent,
            ..SuperResParams::default()
        },
    }
}

/// Synthetic upstream source producing a solid frame.
pub struct SolidSource {
    pub size: FrameSize,
    pub rgba: [f32; 4],
    pub renders: usize,
}

impl SolidSource {
    pub fn new(size: FrameSize, rgba: [f32; 4]) -> Self {
        Self {
            size,
            rgba,
            renders: 0,
        }
    }
}

impl FrameSource for SolidSource {
    fn base_size(&self) -> FrameSize {
        self.size
    }

    fn render(&mut self, pass: &mut CapturePass<'_>) {
        self.renders += 1;
        let size = pass.size();
        let data: Vec<f32> = self
            .rgba
            .iter()
            .copied()
            .cycle()
            .take(size.pixels() as usize * CHANNELS as usize)
            .collect();
        let _ = pass.blit(&data);
    }
}
