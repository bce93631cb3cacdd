//! upscale - demo host for the upscaling filter stage.
//!
//! Drives an animated synthetic source through the full tick/render
//! pipeline and reports throughput, sizes and pool statistics.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;

use upscale_core::{
    FilterConfig, FrameSize, ProviderKind, ProviderSelection, Strength, SuperResParams,
};
use upscale_filter::{FilterFactory, RenderOutcome};
use upscale_gpu::{CapturePass, FrameSource, CHANNELS};

/// Pool buffers idle longer than this are evicted by maintenance.
const POOL_IDLE_LIMIT: Duration = Duration::from_secs(5);
/// Maintenance cadence in frames.
const MAINTAIN_EVERY: u32 = 60;

#[derive(Parser)]
#[command(name = "upscale")]
#[command(author, version, about = "Drive synthetic frames through the upscaling filter stage")]
struct Cli {
    /// Provider: automatic, cpu-superres or wgpu-superres
    #[arg(short, long, default_value = "automatic")]
    provider: String,

    /// Scale factor in percent (100-400)
    #[arg(short, long, default_value_t = 150.0)]
    scale: f64,

    /// Strength class: weak or strong
    #[arg(long, default_value = "weak")]
    strength: String,

    /// Number of frames to run
    #[arg(short = 'n', long, default_value_t = 120)]
    frames: u32,

    /// Source size as WxH
    #[arg(long, default_value = "640x360")]
    size: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Animated diagonal gradient with a moving highlight.
struct GradientSource {
    size: FrameSize,
    frame: u32,
}

impl FrameSource for GradientSource {
    fn base_size(&self) -> FrameSize {
        self.size
    }

    fn render(&mut self, pass: &mut CapturePass<'_>) {
        let size = pass.size();
        let phase = (self.frame % 120) as f32 / 120.0;
        let mut data = Vec::with_capacity(size.pixels() as usize * CHANNELS as usize);

        for y in 0..size.height {
            for x in 0..size.width {
                let fx = x as f32 / size.width.max(1) as f32;
                let fy = y as f32 / size.height.max(1) as f32;
                let highlight = (1.0 - ((fx - phase).abs() * 4.0)).max(0.0);
                data.extend_from_slice(&[
                    fx * 0.8 + highlight * 0.2,
                    fy * 0.8,
                    (1.0 - fx) * 0.6,
                    1.0,
                ]);
            }
        }

        let _ = pass.blit(&data);
    }
}

fn parse_provider(value: &str) -> Result<ProviderSelection> {
    match value {
        "automatic" | "auto" => Ok(ProviderSelection::Automatic),
        "cpu-superres" | "cpu" => Ok(ProviderSelection::Exact(ProviderKind::CpuSuperRes)),
        "wgpu-superres" | "wgpu" => Ok(ProviderSelection::Exact(ProviderKind::WgpuSuperRes)),
        other => bail!("unknown provider '{other}'"),
    }
}

fn parse_strength(value: &str) -> Result<Strength> {
    match value {
        "weak" => Ok(Strength::Weak),
        "strong" => Ok(Strength::Strong),
        other => bail!("unknown strength '{other}'"),
    }
}

fn parse_size(value: &str) -> Result<FrameSize> {
    let Some((w, h)) = value.split_once('x') else {
        bail!("size must be WxH, got '{value}'");
    };
    Ok(FrameSize::new(w.parse()?, h.parse()?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing_subscriber::filter::LevelFilter::DEBUG
        } else {
            tracing_subscriber::filter::LevelFilter::WARN
        })
        .init();

    let config = FilterConfig {
        provider: parse_provider(&cli.provider)?,
        superres: SuperResParams {
            strength: parse_strength(&cli.strength)?,
            scale_percent: cli.scale,
        },
    };
    let size = parse_size(&cli.size)?;

    let Some(factory) = FilterFactory::new() else {
        bail!("no upscaling provider is available on this machine");
    };
    print!("{}", factory.registry().describe());

    let mut instance = factory.create(&config);
    instance.complete_pending_switch();
    if !instance.is_ready() {
        bail!("provider failed to load; see log output");
    }

    let mut source = GradientSource { size, frame: 0 };
    let mut rendered = 0u32;
    let mut bypassed = 0u32;
    let started = Instant::now();

    for frame in 0..cli.frames {
        source.frame = frame;
        instance.video_tick(source.base_size());
        match instance.video_render(Some(&mut source)) {
            RenderOutcome::Rendered(_) => rendered += 1,
            RenderOutcome::Bypassed => bypassed += 1,
        }

        if frame % MAINTAIN_EVERY == MAINTAIN_EVERY - 1 {
            factory.maintain(POOL_IDLE_LIMIT);
        }
    }

    let elapsed = started.elapsed();
    let per_frame = elapsed.as_secs_f64() * 1000.0 / cli.frames.max(1) as f64;

    println!(
        "provider: {}",
        instance
            .active_provider()
            .map(|k| k.name())
            .unwrap_or("none")
    );
    println!("frames:   {} rendered, {} bypassed", rendered, bypassed);
    println!("size:     {} -> {}", instance.input_size(), instance.output_size());
    println!("timing:   {per_frame:.2} ms/frame ({:.2} s total)", elapsed.as_secs_f64());
    println!(
        "pool:     {} hits, {} misses, {} idle",
        factory.pool().hits(),
        factory.pool().misses(),
        factory.pool().idle_count()
    );

    Ok(())
}
