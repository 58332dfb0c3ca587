//! Two-pass blur + threshold compositor turning sparse particle splats into
//! a continuous shaded surface.

use crate::palette;
use bytemuck::{Pod, Zeroable};
use fluidfall_core::{blur_weights, MAX_KERNEL_SIZE};

const SPLAT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Matches the WGSL `BlurParams` uniform: direction + kernel size + weights
/// packed four to a vec4 (std140 array stride).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct BlurParams {
    direction: [f32; 2],
    kernel_size: u32,
    _pad: f32,
    weights: [[f32; 4]; MAX_KERNEL_SIZE / 4],
}

/// Matches the WGSL `ShadeParams` uniform (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ShadeParams {
    texel: [f32; 2],
    threshold: f32,
    bump: f32,
    flags: u32,
    shininess: f32,
    _pad: [f32; 2],
    base_tint: [f32; 4],
}

const FLAG_SPECULAR: u32 = 1;
const FLAG_SHOW_NORMALS: u32 = 2;

struct Targets {
    /// Raw particle splats land here.
    splat_view: wgpu::TextureView,
    /// After the horizontal pass.
    half_blurred_view: wgpu::TextureView,
    /// After both passes; what the shading pass reads.
    blurred_view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl Targets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let make = |label: &str| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: SPLAT_FORMAT,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                        | wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        };

        Self {
            splat_view: make("Fluid Splat Texture"),
            half_blurred_view: make("Fluid Half-Blurred Texture"),
            blurred_view: make("Fluid Blurred Texture"),
            width,
            height,
        }
    }
}

pub struct FluidCompositor {
    blur_pipeline: wgpu::RenderPipeline,
    blur_bind_group_layout: wgpu::BindGroupLayout,
    blur_h_params: wgpu::Buffer,
    blur_v_params: wgpu::Buffer,

    shade_pipeline: wgpu::RenderPipeline,
    shade_bind_group_layout: wgpu::BindGroupLayout,
    shade_params: wgpu::Buffer,

    sampler: wgpu::Sampler,
    targets: Targets,
}

impl FluidCompositor {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let blur_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Blur Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blur.wgsl").into()),
        });

        let shade_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Surface Shade Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/surface.wgsl").into()),
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Fluid Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };
        let uniform_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let blur_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Blur Bind Group Layout"),
                entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
            });

        let shade_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Shade Bind Group Layout"),
                entries: &[uniform_entry(0), texture_entry(1), sampler_entry(2)],
            });

        let blur_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blur Pipeline Layout"),
            bind_group_layouts: &[&blur_bind_group_layout],
            push_constant_ranges: &[],
        });

        let blur_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blur Pipeline"),
            layout: Some(&blur_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &blur_shader,
                entry_point: Some("vertex"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &blur_shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SPLAT_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let shade_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Shade Pipeline Layout"),
            bind_group_layouts: &[&shade_bind_group_layout],
            push_constant_ranges: &[],
        });

        let shade_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shade Pipeline"),
            layout: Some(&shade_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shade_shader,
                entry_point: Some("vertex"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shade_shader,
                entry_point: Some("fragment"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let blur_h_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blur Horizontal Params"),
            size: std::mem::size_of::<BlurParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let blur_v_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Blur Vertical Params"),
            size: std::mem::size_of::<BlurParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let shade_params = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Shade Params"),
            size: std::mem::size_of::<ShadeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("Fluid compositor targets: {width}x{height}");

        Self {
            blur_pipeline,
            blur_bind_group_layout,
            blur_h_params,
            blur_v_params,
            shade_pipeline,
            shade_bind_group_layout,
            shade_params,
            sampler,
            targets: Targets::new(device, width, height),
        }
    }

    /// Where the point renderer splats particles in fluid mode.
    pub fn splat_view(&self) -> &wgpu::TextureView {
        &self.targets.splat_view
    }

    pub fn splat_format() -> wgpu::TextureFormat {
        SPLAT_FORMAT
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.targets = Targets::new(device, width, height);
    }

    /// Upload both blur passes' parameters for the configured kernel size.
    pub fn set_kernel(&mut self, queue: &wgpu::Queue, kernel_size: usize) {
        let kernel_size = kernel_size.clamp(1, MAX_KERNEL_SIZE);
        let weights = blur_weights(kernel_size);
        let mut packed = [[0.0_f32; 4]; MAX_KERNEL_SIZE / 4];
        for (i, w) in weights.iter().enumerate() {
            packed[i / 4][i % 4] = *w;
        }

        let texel = [
            1.0 / self.targets.width as f32,
            1.0 / self.targets.height as f32,
        ];
        // Pass 1 steps horizontally (vertical step zero), pass 2 vertically.
        for (buffer, direction) in [
            (&self.blur_h_params, [texel[0], 0.0]),
            (&self.blur_v_params, [0.0, texel[1]]),
        ] {
            let params = BlurParams {
                direction,
                kernel_size: kernel_size as u32,
                _pad: 0.0,
                weights: packed,
            };
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[params]));
        }
    }

    /// Update the shading controls for `draw`.
    #[allow(clippy::too_many_arguments)]
    pub fn set_shading(
        &self,
        queue: &wgpu::Queue,
        threshold: f32,
        bump: f32,
        shininess: f32,
        specular: bool,
        show_normals: bool,
    ) {
        let mut flags = 0;
        if specular {
            flags |= FLAG_SPECULAR;
        }
        if show_normals {
            flags |= FLAG_SHOW_NORMALS;
        }
        let params = ShadeParams {
            texel: [
                1.0 / self.targets.width as f32,
                1.0 / self.targets.height as f32,
            ],
            threshold,
            bump,
            flags,
            shininess,
            _pad: [0.0; 2],
            base_tint: palette::obstacle(),
        };
        queue.write_buffer(&self.shade_params, 0, bytemuck::cast_slice(&[params]));
    }

    fn blur_pass(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        params: &wgpu::Buffer,
        source: &wgpu::TextureView,
        target: &wgpu::TextureView,
        label: &str,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.blur_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.blur_pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    /// Separable blur: splat -> half-blurred -> blurred. Both passes complete
    /// inside one submission, strictly before any `draw` of the same frame.
    pub fn process(&self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Fluid Blur Encoder"),
        });

        self.blur_pass(
            device,
            &mut encoder,
            &self.blur_h_params,
            &self.targets.splat_view,
            &self.targets.half_blurred_view,
            "Horizontal Blur Pass",
        );
        self.blur_pass(
            device,
            &mut encoder,
            &self.blur_v_params,
            &self.targets.half_blurred_view,
            &self.targets.blurred_view,
            "Vertical Blur Pass",
        );

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Threshold + shade the blurred field onto the surface.
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shade Bind Group"),
            layout: &self.shade_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.shade_params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.targets.blurred_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Fluid Shade Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fluid Shade Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(palette::background()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(&self.shade_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}
