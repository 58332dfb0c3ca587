//! GPU-based particle simulation manager.
//!
//! Particle state lives in two storage buffers, one per generation. Every
//! step reads the current generation and writes the other through one of two
//! pre-built bind groups, then flips the `current` index. The swap is a single
//! index flip; the two arrays of a generation always travel together.

use crate::SimParams;
use fluidfall_core::{Particle, SimulationDomain};
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 256;

pub struct ParticleSimulation {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    obstacle_view: wgpu::TextureView,
    obstacle_size: (u32, u32),

    // Generation ring: buffers[current] is readable, buffers[1 - current] is
    // the write target of the in-progress step.
    buffers: [wgpu::Buffer; 2],
    bind_groups: [wgpu::BindGroup; 2],
    current: usize,

    particle_count: u32,
    domain: SimulationDomain,
}

impl ParticleSimulation {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        obstacle_view: wgpu::TextureView,
        obstacle_size: (u32, u32),
        domain: SimulationDomain,
        particles: &[Particle],
    ) -> Self {
        log::info!("Initializing ParticleSimulation with {} particles", particles.len());

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Step Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/step.wgsl").into()),
        });

        let params = SimParams::new(&domain, obstacle_size, particles.len() as u32, 0.0, 0.0);
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Step Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Current generation, read-only.
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Next generation, write target.
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Composited obstacle field.
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Step Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Step Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let (buffers, bind_groups) = Self::create_generations(
            &device,
            &bind_group_layout,
            &params_buffer,
            &obstacle_view,
            particles,
        );

        log::info!("Step pipeline created");

        Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
            obstacle_view,
            obstacle_size,
            buffers,
            bind_groups,
            current: 0,
            particle_count: particles.len() as u32,
            domain,
        }
    }

    fn create_generations(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params_buffer: &wgpu::Buffer,
        obstacle_view: &wgpu::TextureView,
        particles: &[Particle],
    ) -> ([wgpu::Buffer; 2], [wgpu::BindGroup; 2]) {
        // Both generations start from the same randomized state; the first
        // step overwrites generation B before anything reads it.
        let buffers = [0, 1].map(|i| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Particle Generation Buffer {i}")),
                contents: bytemuck::cast_slice(particles),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            })
        });

        let bind_groups = [0usize, 1].map(|read| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Step Bind Group (read {read})")),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: buffers[read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: buffers[1 - read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(obstacle_view),
                    },
                ],
            })
        });

        (buffers, bind_groups)
    }

    /// Advance the whole population by one step and swap generations.
    ///
    /// `dt` must already be clamped (and speed-scaled) by the frame driver.
    /// The obstacle upload for this frame must be submitted before this call.
    pub fn step(&mut self, dt: f32, gravity: f32) {
        let params = SimParams::new(
            &self.domain,
            self.obstacle_size,
            self.particle_count,
            dt,
            gravity,
        );
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[params]));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Step Encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Step Compute Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.current], &[]);
            pass.dispatch_workgroups(self.particle_count.div_ceil(WORKGROUP_SIZE), 1, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        // The swap: next becomes current. One index flip, never a copy.
        self.current = 1 - self.current;
    }

    /// Replace the whole population. Both generations are rebuilt and the
    /// ring restarts at generation 0.
    pub fn reset(&mut self, particles: &[Particle], domain: SimulationDomain) {
        log::info!("Resetting simulation to {} particles", particles.len());
        let (buffers, bind_groups) = Self::create_generations(
            &self.device,
            &self.bind_group_layout,
            &self.params_buffer,
            &self.obstacle_view,
            particles,
        );
        self.buffers = buffers;
        self.bind_groups = bind_groups;
        self.current = 0;
        self.particle_count = particles.len() as u32;
        self.domain = domain;
    }

    /// The readable generation, for the renderers.
    pub fn current_buffer(&self) -> &wgpu::Buffer {
        &self.buffers[self.current]
    }

    pub fn particle_count(&self) -> u32 {
        self.particle_count
    }

    pub fn domain(&self) -> SimulationDomain {
        self.domain
    }
}
