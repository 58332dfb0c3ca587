//! Renders the current particle generation as screen-space points.
//!
//! The same shader serves two targets: the swapchain surface (points mode)
//! and the compositor's splat texture (fluid mode), where additive blending
//! accumulates density in the alpha channel.

use crate::palette;
use bytemuck::{Pod, Zeroable};
use fluidfall_core::SimulationDomain;

/// Matches the WGSL `PointParams` uniform (32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct PointParams {
    domain: [f32; 2],
    resolution: [f32; 2],
    point_size: f32,
    max_speed: f32,
    alpha: f32,
    _pad: f32,
}

pub struct PointRenderer {
    surface_pipeline: wgpu::RenderPipeline,
    splat_pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
}

/// Density each splatted point contributes to the fluid field.
const SPLAT_ALPHA: f32 = 0.35;

impl PointRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        splat_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/point.wgsl").into()),
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Point Params Buffer"),
            size: std::mem::size_of::<PointParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Current particle generation.
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, format: wgpu::TextureFormat, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vertex"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fragment"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        let surface_pipeline = make_pipeline(
            "Point Surface Pipeline",
            surface_format,
            wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
        );

        // Splats accumulate: src ONE, dst ONE on every channel.
        let splat_pipeline = make_pipeline(
            "Point Splat Pipeline",
            splat_format,
            wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::One,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
            },
        );

        Self {
            surface_pipeline,
            splat_pipeline,
            bind_group_layout,
            params_buffer,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn render_inner(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &wgpu::RenderPipeline,
        target: &wgpu::TextureView,
        clear: wgpu::Color,
        particle_buffer: &wgpu::Buffer,
        particle_count: u32,
        params: PointParams,
    ) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: particle_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Point Render Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..6, 0..particle_count);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    /// Points mode: draw the current generation straight to the surface.
    #[allow(clippy::too_many_arguments)]
    pub fn render_to_surface(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_view: &wgpu::TextureView,
        resolution: (u32, u32),
        domain: &SimulationDomain,
        particle_buffer: &wgpu::Buffer,
        particle_count: u32,
        point_size: f32,
    ) {
        self.render_inner(
            device,
            queue,
            &self.surface_pipeline,
            surface_view,
            palette::background(),
            particle_buffer,
            particle_count,
            PointParams {
                domain: [domain.width, domain.height],
                resolution: [resolution.0 as f32, resolution.1 as f32],
                point_size,
                max_speed: domain.max_speed,
                alpha: 1.0,
                _pad: 0.0,
            },
        );
    }

    /// Fluid mode: rasterize the generation into the compositor's splat
    /// texture. Particle identity ends here; the compositor only ever sees
    /// the aggregated pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn render_to_splat(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        splat_view: &wgpu::TextureView,
        resolution: (u32, u32),
        domain: &SimulationDomain,
        particle_buffer: &wgpu::Buffer,
        particle_count: u32,
        point_size: f32,
    ) {
        self.render_inner(
            device,
            queue,
            &self.splat_pipeline,
            splat_view,
            wgpu::Color::TRANSPARENT,
            particle_buffer,
            particle_count,
            PointParams {
                domain: [domain.width, domain.height],
                resolution: [resolution.0 as f32, resolution.1 as f32],
                point_size,
                max_speed: domain.max_speed,
                alpha: SPLAT_ALPHA,
                _pad: 0.0,
            },
        );
    }
}
