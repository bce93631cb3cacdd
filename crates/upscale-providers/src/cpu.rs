//! CPU super-sampling engine.
//!
//! Rayon-parallel separable resampling: a bilinear kernel for the weak
//! strength class, Mitchell-Netravali bicubic plus an unsharp pass for
//! strong. Always compiles and always initializes, which makes it the
//! lowest-priority fallback in the registry.

use rayon::prelude::*;

use upscale_core::{FrameSize, ProviderKind, Strength, SuperResParams};
use upscale_gpu::{Texture, CHANNELS};

use crate::engine::{LoadContext, UpscaleEngine};
use crate::{ProviderError, ProviderResult};

const CH: usize = CHANNELS as usize;

/// Unsharp amount applied for the strong strength class.
const SHARPEN_AMOUNT: f32 = 0.25;

/// CPU super-sampling provider.
pub struct CpuSuperRes {
    pool: upscale_gpu::BufferPool<upscale_gpu::PixelBuffer>,
    params: SuperResParams,
}

impl CpuSuperRes {
    /// Loads the engine. Cannot fail; the signature matches the provider
    /// load contract.
    pub fn load(ctx: &LoadContext) -> ProviderResult<Self> {
        Ok(Self {
            pool: ctx.pool.clone(),
            params: SuperResParams::default(),
        })
    }
}

impl UpscaleEngine for CpuSuperRes {
    fn kind(&self) -> ProviderKind {
        ProviderKind::CpuSuperRes
    }

    fn configure(&mut self, params: &SuperResParams) -> ProviderResult<()> {
        self.params = params.sanitized();
        Ok(())
    }

    fn output_size(&self, input: FrameSize) -> FrameSize {
        input.scaled(self.params.scale_factor())
    }

    fn process(&mut self, input: &Texture) -> ProviderResult<Option<Texture>> {
        let src_size = input.size();
        if src_size.is_empty() {
            return Err(ProviderError::process("empty input frame"));
        }

        let dst_size = self.output_size(src_size);
        let kernel = match self.params.strength {
            Strength::Weak => ResampleKernel::Bilinear,
            Strength::Strong => ResampleKernel::Mitchell,
        };

        let temp = resample_horizontal(
            input.data(),
            src_size.width as usize,
            src_size.height as usize,
            dst_size.width as usize,
            kernel,
        );
        let mut pixels = resample_vertical(
            &temp,
            dst_size.width as usize,
            src_size.height as usize,
            dst_size.height as usize,
            kernel,
        );

        if self.params.strength == Strength::Strong {
            pixels = sharpen_rgb(
                &pixels,
                dst_size.width as usize,
                dst_size.height as usize,
                SHARPEN_AMOUNT,
            );
        }

        let texture = Texture::from_pixels(&self.pool, dst_size, &pixels)?;
        Ok(Some(texture))
    }
}

// =============================================================================
// Resampling
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum ResampleKernel {
    Bilinear,
    Mitchell,
}

impl ResampleKernel {
    #[inline]
    fn support(self) -> f32 {
        match self {
            Self::Bilinear => 1.0,
            Self::Mitchell => 2.0,
        }
    }

    #[inline]
    fn weight(self, x: f32) -> f32 {
        match self {
            Self::Bilinear => {
                let ax = x.abs();
                if ax < 1.0 { 1.0 - ax } else { 0.0 }
            }
            Self::Mitchell => mitchell_weight(x),
        }
    }
}

/// Mitchell-Netravali with B = C = 1/3.
#[inline]
fn mitchell_weight(x: f32) -> f32 {
    const B: f32 = 1.0 / 3.0;
    const C: f32 = 1.0 / 3.0;

    let ax = x.abs();
    if ax < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * ax * ax * ax
            + (-18.0 + 12.0 * B + 6.0 * C) * ax * ax
            + (6.0 - 2.0 * B))
            / 6.0
    } else if ax < 2.0 {
        ((-B - 6.0 * C) * ax * ax * ax
            + (6.0 * B + 30.0 * C) * ax * ax
            + (-12.0 * B - 48.0 * C) * ax
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

/// Horizontal pass: (sw x sh) -> (dw x sh), parallel over rows.
fn resample_horizontal(
    src: &[f32],
    sw: usize,
    sh: usize,
    dw: usize,
    kernel: ResampleKernel,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; dw * sh * CH];
    let scale = sw as f32 / dw as f32;
    let support = kernel.support() * scale.max(1.0);

    dst.par_chunks_mut(dw * CH).enumerate().for_each(|(y, row)| {
        for x in 0..dw {
            let center = (x as f32 + 0.5) * scale - 0.5;
            let left = ((center - support).floor() as isize).max(0) as usize;
            let right = ((center + support).ceil() as usize).min(sw - 1);

            let mut sum = [0.0f32; CH];
            let mut weight_sum = 0.0f32;

            for sx in left..=right {
                let dist = (sx as f32 - center) / scale.max(1.0);
                let w = kernel.weight(dist);
                weight_sum += w;

                let src_idx = (y * sw + sx) * CH;
                for c in 0..CH {
                    sum[c] += src[src_idx + c] * w;
                }
            }

            if weight_sum != 0.0 {
                let dst_idx = x * CH;
                for c in 0..CH {
                    row[dst_idx + c] = sum[c] / weight_sum;
                }
            }
        }
    });

    dst
}

/// Vertical pass: (w x sh) -> (w x dh), parallel over output rows.
fn resample_vertical(
    src: &[f32],
    w: usize,
    sh: usize,
    dh: usize,
    kernel: ResampleKernel,
) -> Vec<f32> {
    let mut dst = vec![0.0f32; w * dh * CH];
    let scale = sh as f32 / dh as f32;
    let support = kernel.support() * scale.max(1.0);

    dst.par_chunks_mut(w * CH).enumerate().for_each(|(y, row)| {
        let center = (y as f32 + 0.5) * scale - 0.5;
        let top = ((center - support).floor() as isize).max(0) as usize;
        let bottom = ((center + support).ceil() as usize).min(sh - 1);

        for x in 0..w {
            let mut sum = [0.0f32; CH];
            let mut weight_sum = 0.0f32;

            for sy in top..=bottom {
                let dist = (sy as f32 - center) / scale.max(1.0);
                let w_k = kernel.weight(dist);
                weight_sum += w_k;

                let src_idx = (sy * w + x) * CH;
                for c in 0..CH {
                    sum[c] += src[src_idx + c] * w_k;
                }
            }

            if weight_sum != 0.0 {
                let dst_idx = x * CH;
                for c in 0..CH {
                    row[dst_idx + c] = sum[c] / weight_sum;
                }
            }
        }
    });

    dst
}

/// 3x3 unsharp pass on the color channels; alpha passes through.
///
/// Kernel: center `1 + 4a`, cross `-a`, clamp-to-edge sampling.
fn sharpen_rgb(src: &[f32], w: usize, h: usize, amount: f32) -> Vec<f32> {
    let mut dst = vec![0.0f32; src.len()];
    let center = 1.0 + 4.0 * amount;

    dst.par_chunks_mut(w * CH).enumerate().for_each(|(y, row)| {
        let y_up = y.saturating_sub(1);
        let y_down = (y + 1).min(h - 1);

        for x in 0..w {
            let x_left = x.saturating_sub(1);
            let x_right = (x + 1).min(w - 1);

            let at = |px: usize, py: usize, c: usize| src[(py * w + px) * CH + c];

            for c in 0..3 {
                let value = at(x, y, c) * center
                    - amount
                        * (at(x_left, y, c) + at(x_right, y, c) + at(x, y_up, c) + at(x, y_down, c));
                row[x * CH + c] = value;
            }
            row[x * CH + 3] = at(x, y, 3);
        }
    });

    dst
}
