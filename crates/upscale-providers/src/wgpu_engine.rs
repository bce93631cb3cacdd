//! wgpu super-resolution engine.
//!
//! Runs the upscale as a compute dispatch: upload the captured frame into
//! a storage buffer, execute the reconstruction kernel, read the result
//! back into a pooled buffer. Availability is probed by requesting an
//! adapter; a machine without one marks this provider permanently
//! unavailable in the registry.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use upscale_core::{FrameSize, ProviderKind, Strength, SuperResParams};
use upscale_gpu::{BufferPool, PixelBuffer, Texture, CHANNELS};

use crate::engine::{LoadContext, UpscaleEngine};
use crate::shaders;
use crate::{ProviderError, ProviderResult};

/// Unsharp amount for the strong strength class.
const SHARPEN_AMOUNT: f32 = 0.25;

/// Dimensions uniform: [width, height, channels, 0].
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// Tuning uniform, padded to 16 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ParamsUniform {
    sharpen: f32,
    _pad: [f32; 3],
}

/// GPU super-resolution provider.
pub struct WgpuSuperRes {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    pool: BufferPool<PixelBuffer>,
    params: SuperResParams,
}

impl WgpuSuperRes {
    /// Probes for a usable adapter without creating a device.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Loads the engine: adapter, device, compute pipeline.
    pub fn load(ctx: &LoadContext) -> ProviderResult<Self> {
        pollster::block_on(Self::load_async(ctx))
    }

    async fn load_async(ctx: &LoadContext) -> ProviderResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ProviderError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("upscale_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter.limits(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ProviderError::DeviceCreation(e.to_string()))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("upscale_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::UPSCALE.into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("upscale_pipeline"),
            layout: None, // Auto layout
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            pool: ctx.pool.clone(),
            params: SuperResParams::default(),
        })
    }

    fn create_dims_buffer(&self, w: u32, h: u32, c: u32) -> wgpu::Buffer {
        let uniform = DimsUniform {
            dims: [w, h, c, 0],
        };
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("dims_uniform"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }

    fn readback(&self, buffer: &wgpu::Buffer, size_bytes: u64) -> ProviderResult<Vec<f32>> {
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(buffer, 0, &staging, 0, size_bytes);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ProviderError::process("map channel closed"))?
            .map_err(|e| ProviderError::process(format!("map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(result)
    }
}

impl UpscaleEngine for WgpuSuperRes {
    fn kind(&self) -> ProviderKind {
        ProviderKind::WgpuSuperRes
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

        let src_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("upscale_src"),
                contents: bytemuck::cast_slice(input.data()),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            });

        let dst_bytes = dst_size.pixels() * CHANNELS as u64 * 4;
        let dst_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("upscale_dst"),
            size: dst_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let src_dims = self.create_dims_buffer(src_size.width, src_size.height, CHANNELS as u32);
        let dst_dims = self.create_dims_buffer(dst_size.width, dst_size.height, 0);

        let sharpen = match self.params.strength {
            Strength::Weak => 0.0,
            Strength::Strong => SHARPEN_AMOUNT,
        };
        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("upscale_params"),
                contents: bytemuck::bytes_of(&ParamsUniform {
                    sharpen,
                    _pad: [0.0; 3],
                }),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let layout = self.pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("upscale_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: src_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: dst_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: src_dims.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: dst_dims.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("upscale_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("upscale_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(dst_size.width.div_ceil(16), dst_size.height.div_ceil(16), 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);

        let pixels = self.readback(&dst_buffer, dst_bytes)?;
        let texture = Texture::from_pixels(&self.pool, dst_size, &pixels)?;
        Ok(Some(texture))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use upscale_gpu::pixel_buffer_pool;

    #[test]
    fn test_upscale_roundtrip() {
        if !WgpuSuperRes::is_available() {
            // No adapter on this machine; the registry would mark the
            // provider unavailable, so there is nothing to test.
            return;
        }

        let pool = pixel_buffer_pool();
        let ctx = LoadContext::new(pool.clone());
        let mut engine = WgpuSuperRes::load(&ctx).unwrap();
        engine
            .configure(&SuperResParams {
                strength: Strength::Weak,
                scale_percent: 200.0,
            })
            .unwrap();

        let data = vec![0.5f32; 8 * 8 * 4];
        let input = Texture::from_pixels(&pool, FrameSize::new(8, 8), &data).unwrap();

        let out = engine.process(&input).unwrap().unwrap();
        assert_eq!(out.size(), FrameSize::new(16, 16));
        for &v in out.data() {
            assert!((v - 0.5).abs() < 1e-3);
        }
    }
}
