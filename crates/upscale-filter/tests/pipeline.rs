//! Frame pipeline scenarios: bypass, processing failures, caching,
//! alpha restoration, automatic selection.

mod common;

use std::sync::atomic::Ordering;

use common::{exact_config, scripted_registry, Event, SolidSource};
use upscale_core::{FilterConfig, FrameSize, ProviderKind, ProviderSelection};
use upscale_filter::{FilterFactory, RenderOutcome};
use upscale_gpu::FrameSource;

const A: ProviderKind = ProviderKind::CpuSuperRes;
const B: ProviderKind = ProviderKind::WgpuSuperRes;

#[test]
fn test_automatic_selection_single_provider() {
    // Scenario: only one provider initialized, config asks for automatic.
    let (registry, _, _) = scripted_registry(&[(A, true, 10), (B, false, 100)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let config = FilterConfig {
        provider: ProviderSelection::Automatic,
        ..FilterConfig::default()
    };
    let mut instance = factory.create(&config);
    instance.complete_pending_switch();

    let mut source = SolidSource::new(FrameSize::new(8, 8), [0.3, 0.3, 0.3, 1.0]);
    instance.video_tick(source.base_size());
    let outcome = instance.video_render(Some(&mut source));

    assert_eq!(instance.active_provider(), Some(A));
    assert!(instance.is_ready());
    assert!(!outcome.is_bypassed());
}

#[test]
fn test_not_ready_always_bypasses() {
    let (registry, recorder, scripts) = scripted_registry(&[(A, true, 10)]);
    scripts[&A].load_failures.store(1, Ordering::SeqCst);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();
    assert!(!instance.is_ready());

    let mut source = SolidSource::new(FrameSize::new(8, 8), [0.5; 4]);
    for _ in 0..10 {
        instance.video_tick(source.base_size());
        let outcome = instance.video_render(Some(&mut source));
        assert!(outcome.is_bypassed());
    }
    // Bypass means no capture and no processing at all.
    assert_eq!(source.renders, 0);
    assert_eq!(recorder.count(Event::Processed(A)), 0);
}

#[test]
fn test_missing_source_bypasses() {
    let (registry, _, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();
    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();

    instance.video_tick(FrameSize::new(8, 8));
    assert!(instance.video_render(None).is_bypassed());
}

#[test]
fn test_zero_sized_frame_bypasses_and_reports_nonzero_size() {
    let (registry, _, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();
    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();

    let mut source = SolidSource::new(FrameSize::new(0, 0), [0.5; 4]);
    instance.video_tick(source.base_size());
    assert!(instance.video_render(Some(&mut source)).is_bypassed());

    // The host-visible size is clamped even for a (0,0) input.
    let out = instance.output_size();
    assert!(out.width >= 1 && out.height >= 1);
}

#[test]
fn test_process_failure_skips_tick_and_retries_fresh() {
    // Scenario: process fails on tick N; tick N shows no output and
    // stays dirty, tick N+1 recaptures and succeeds.
    let (registry, recorder, scripts) = scripted_registry(&[(A, true, 10)]);
    scripts[&A].process_failures.store(1, Ordering::SeqCst);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();

    let mut source = SolidSource::new(FrameSize::new(8, 8), [0.5; 4]);

    instance.video_tick(source.base_size());
    let first = instance.video_render(Some(&mut source));
    assert!(first.is_bypassed());
    assert!(instance.is_dirty());
    assert_eq!(source.renders, 1);

    instance.video_tick(source.base_size());
    let second = instance.video_render(Some(&mut source));
    assert!(!second.is_bypassed());
    assert!(!instance.is_dirty());
    // The retry captured a fresh frame.
    assert_eq!(source.renders, 2);
    assert_eq!(recorder.count(Event::Processed(A)), 1);
}

#[test]
fn test_empty_result_is_contract_violation() {
    let (registry, _, scripts) = scripted_registry(&[(A, true, 10)]);
    scripts[&A].empty_results.store(1, Ordering::SeqCst);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();

    let mut source = SolidSource::new(FrameSize::new(4, 4), [0.5; 4]);
    instance.video_tick(source.base_size());
    assert!(instance.video_render(Some(&mut source)).is_bypassed());
    assert!(instance.is_dirty());

    // The next tick recovers.
    instance.video_tick(source.base_size());
    assert!(!instance.video_render(Some(&mut source)).is_bypassed());
}

#[test]
fn test_cached_output_reused_until_next_tick() {
    let (registry, recorder, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();

    let mut source = SolidSource::new(FrameSize::new(8, 8), [0.5; 4]);
    instance.video_tick(source.base_size());

    let first = match instance.video_render(Some(&mut source)) {
        RenderOutcome::Rendered(tex) => tex,
        RenderOutcome::Bypassed => panic!("expected output"),
    };
    // A second render without an intervening tick serves the cache.
    let second = match instance.video_render(Some(&mut source)) {
        RenderOutcome::Rendered(tex) => tex,
        RenderOutcome::Bypassed => panic!("expected output"),
    };

    assert_eq!(first.buffer_id(), second.buffer_id());
    assert_eq!(recorder.count(Event::Processed(A)), 1);
    assert_eq!(source.renders, 1);
}

#[test]
fn test_output_restores_capture_alpha() {
    let (registry, _, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    // Scale 100% so coordinates map one-to-one.
    let mut instance = factory.create(&exact_config(A, 100.0));
    instance.complete_pending_switch();

    // Upstream frame: semi-transparent red. The scripted engine forces
    // its output alpha opaque, so any translucency in the result must
    // come from the restore step.
    let mut source = SolidSource::new(FrameSize::new(4, 4), [0.8, 0.1, 0.1, 0.25]);
    instance.video_tick(source.base_size());

    let output = match instance.video_render(Some(&mut source)) {
        RenderOutcome::Rendered(tex) => tex,
        RenderOutcome::Bypassed => panic!("expected output"),
    };

    let px = output.pixel(2, 2).unwrap();
    assert!((px[0] - 0.8).abs() < 1e-6);
    assert!((px[3] - 0.25).abs() < 1e-6, "capture alpha must be restored");
}

#[test]
fn test_tick_scales_output_size_when_ready() {
    let (registry, _, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 200.0));
    instance.complete_pending_switch();

    instance.video_tick(FrameSize::new(640, 360));
    assert_eq!(instance.input_size(), FrameSize::new(640, 360));
    assert_eq!(instance.output_size(), FrameSize::new(1280, 720));
}

#[test]
fn test_update_forwards_parameters_to_ready_engine() {
    let (registry, recorder, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 100.0));
    instance.complete_pending_switch();
    let configured_before = recorder.count(Event::Configured(A));

    let mut config = exact_config(A, 300.0);
    instance.update(&config);
    assert!(recorder.count(Event::Configured(A)) > configured_before);

    instance.video_tick(FrameSize::new(100, 100));
    assert_eq!(instance.output_size(), FrameSize::new(300, 300));

    // Out-of-range scales are clamped before reaching the engine.
    config.superres.scale_percent = 1000.0;
    instance.update(&config);
    instance.video_tick(FrameSize::new(100, 100));
    assert_eq!(instance.output_size(), FrameSize::new(400, 400));
}

#[test]
fn test_unavailable_exact_selection_keeps_current_provider() {
    let (registry, _, _) = scripted_registry(&[(A, true, 10), (B, false, 100)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();
    assert_eq!(instance.active_provider(), Some(A));

    // Selecting the dead provider changes nothing, and does not fall
    // back to automatic selection.
    instance.update(&exact_config(B, 150.0));
    instance.complete_pending_switch();
    assert_eq!(instance.active_provider(), Some(A));
    assert!(instance.is_ready());
}

#[test]
fn test_pool_reuse_across_rendered_frames() {
    let (registry, _, _) = scripted_registry(&[(A, true, 10)]);
    let factory = FilterFactory::with_registry(registry).unwrap();

    let mut instance = factory.create(&exact_config(A, 150.0));
    instance.complete_pending_switch();

    let mut source = SolidSource::new(FrameSize::new(16, 16), [0.5; 4]);
    for _ in 0..4 {
        instance.video_tick(source.base_size());
        let _ = instance.video_render(Some(&mut source));
    }

    // Steady-state frames are served from the pool, not fresh
    // allocations.
    assert!(factory.pool().hits() > 0);
}
