//! Falling-particle fluid toy.
//!
//! A GPU compute step advances the population, the pointer paints obstacles,
//! and the compositor melts the points into a shaded surface.

mod gui;

use fluidfall_core::{Particle, SimulationDomain};
use fluidfall_render::{
    FluidCompositor, ObstacleRenderer, PointRenderer, RenderMode,
};
use fluidfall_sim::{ObstacleField, ParticleSimulation};
use glam::Vec2;
use gui::{Gui, UiState};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Visible world height in world units; width follows the window aspect.
const DOMAIN_HEIGHT: f32 = 2.0;

/// Longest frame the simulation will integrate over. Anything slower (hitches,
/// window drags) is treated as this instead of teleporting particles.
const MAX_FRAME_DT: f32 = 0.1;

fn initialize_particles(count: u32, domain: &SimulationDomain) -> Vec<Particle> {
    let mut rng = rand::rng();
    let particles: Vec<Particle> = (0..count)
        .map(|_| Particle::random(domain, &mut rng))
        .collect();

    log::info!("Initialized {count} particles");
    particles
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    domain: SimulationDomain,
    obstacles: ObstacleField,
    simulation: ParticleSimulation,

    point_renderer: PointRenderer,
    compositor: FluidCompositor,
    obstacle_renderer: ObstacleRenderer,

    gui: Gui,
    ui_state: UiState,

    // Pointer position in normalized [0,1]^2 field coordinates, v up.
    cursor: Option<Vec2>,
    painting: bool,

    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::VULKAN,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone()).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: wgpu::ExperimentalFeatures::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // World geometry is fixed at startup; the field resolution too. Only
        // the render targets track later window resizes.
        let aspect = size.width.max(1) as f32 / size.height.max(1) as f32;
        let domain = SimulationDomain::new(DOMAIN_HEIGHT * aspect, DOMAIN_HEIGHT);

        let obstacles = ObstacleField::new(&device, size.width.max(1), size.height.max(1));

        let ui_state = UiState::default();
        let particles = initialize_particles(ui_state.particle_count, &domain);
        let simulation = ParticleSimulation::new(
            device.clone(),
            queue.clone(),
            obstacles.view().clone(),
            obstacles.size(),
            domain,
            &particles,
        );
        log::info!("Simulation initialized");

        let point_renderer =
            PointRenderer::new(&device, config.format, FluidCompositor::splat_format());
        let compositor = FluidCompositor::new(&device, config.format, config.width, config.height);
        let obstacle_renderer = ObstacleRenderer::new(&device, config.format);
        log::info!("Renderers initialized");

        let gui = Gui::new(&device, config.format, &window);

        Self {
            surface,
            device,
            queue,
            config,
            domain,
            obstacles,
            simulation,
            point_renderer,
            compositor,
            obstacle_renderer,
            gui,
            ui_state,
            cursor: None,
            painting: false,
            frame_times: VecDeque::with_capacity(100),
            last_frame_time: Instant::now(),
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.compositor
                .resize(&self.device, self.config.width, self.config.height);
            // Texel size changed; both uniform sets must be re-uploaded.
            self.ui_state.kernel_dirty = true;
            self.ui_state.shading_dirty = true;
        }
    }

    /// Map a physical cursor position to normalized field coordinates
    /// (`v` grows upward, like the world y axis).
    fn cursor_to_field(&self, x: f64, y: f64) -> Vec2 {
        let u = (x / self.config.width.max(1) as f64).clamp(0.0, 1.0);
        let v = 1.0 - (y / self.config.height.max(1) as f64).clamp(0.0, 1.0);
        Vec2::new(u as f32, v as f32)
    }

    fn render(&mut self, window: &Window) -> Result<(f32, f32), wgpu::SurfaceError> {
        let now = Instant::now();
        let elapsed = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.frame_times.push_back(elapsed * 1000.0);
        if self.frame_times.len() > 100 {
            self.frame_times.pop_front();
        }
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = 1000.0 / avg_frame_time;
        self.ui_state.fps = fps;
        self.ui_state.frame_time = avg_frame_time;

        // UI-driven rebuilds come first so this frame already simulates the
        // requested state.
        if self.ui_state.reset_requested {
            self.ui_state.reset_requested = false;
            let particles = initialize_particles(self.ui_state.particle_count, &self.domain);
            self.simulation.reset(&particles, self.domain);
        }
        if self.ui_state.clear_obstacles_requested {
            self.ui_state.clear_obstacles_requested = false;
            self.obstacles.clear();
        }

        // Pointer disc follows the cursor every frame; holding the left
        // button additionally commits the stroke into the static layer.
        if let Some(cursor) = self.cursor {
            if self.painting {
                self.obstacles.paint_static(cursor, self.ui_state.brush_size);
            } else {
                self.obstacles.set_mobile(cursor, self.ui_state.brush_size);
            }
        }

        // Field upload strictly precedes the step that samples it.
        self.obstacles.upload(&self.queue);

        let dt = elapsed.clamp(0.0, MAX_FRAME_DT) * self.ui_state.speed_multiplier;
        if !self.ui_state.is_paused && dt > 0.0 {
            self.simulation.step(dt, self.ui_state.gravity);
        }

        if self.ui_state.kernel_dirty {
            self.ui_state.kernel_dirty = false;
            self.compositor
                .set_kernel(&self.queue, self.ui_state.kernel_size);
        }
        if self.ui_state.shading_dirty {
            self.ui_state.shading_dirty = false;
            self.compositor.set_shading(
                &self.queue,
                self.ui_state.blur_threshold,
                self.ui_state.bump,
                self.ui_state.shininess,
                self.ui_state.specular,
                self.ui_state.show_normals,
            );
        }

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let resolution = (self.config.width, self.config.height);
        match self.ui_state.render_mode {
            RenderMode::Points => {
                self.point_renderer.render_to_surface(
                    &self.device,
                    &self.queue,
                    &view,
                    resolution,
                    &self.domain,
                    self.simulation.current_buffer(),
                    self.simulation.particle_count(),
                    self.ui_state.point_size,
                );
            }
            RenderMode::Fluid => {
                self.point_renderer.render_to_splat(
                    &self.device,
                    &self.queue,
                    self.compositor.splat_view(),
                    resolution,
                    &self.domain,
                    self.simulation.current_buffer(),
                    self.simulation.particle_count(),
                    self.ui_state.point_size,
                );
                self.compositor.process(&self.device, &self.queue);
                self.compositor.draw(&self.device, &self.queue, &view);
            }
        }

        if self.ui_state.show_obstacles {
            self.obstacle_renderer.render(
                &self.device,
                &self.queue,
                &view,
                self.obstacles.view(),
                self.ui_state.obstacle_display,
            );
        }

        {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("GUI Encoder"),
                });

            self.gui.render(
                &self.device,
                &self.queue,
                &mut encoder,
                window,
                &view,
                &mut self.ui_state,
            );

            self.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();
        Ok((fps, avg_frame_time))
    }
}

#[derive(Default)]
struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window_attributes = Window::default_attributes()
                .with_title("Fluidfall")
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

            let window = Arc::new(event_loop.create_window(window_attributes).unwrap());
            self.window = Some(window.clone());
            self.gpu_state = Some(pollster::block_on(GpuState::new(window)));
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // The GUI gets first refusal on every event.
        if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
            if gpu_state.gui.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::KeyR),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.ui_state.reset_requested = true;
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::KeyC),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.ui_state.clear_obstacles_requested = true;
                }
            }

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    if let Some(gpu_state) = &mut self.gpu_state {
                        gpu_state.painting = state == ElementState::Pressed;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.cursor =
                        Some(gpu_state.cursor_to_field(position.x, position.y));
                }
            }

            WindowEvent::CursorLeft { .. } => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.cursor = None;
                    gpu_state.painting = false;
                }
            }

            WindowEvent::RedrawRequested => {
                if let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) {
                    match gpu_state.render(window) {
                        Ok((fps, frame_time)) => {
                            window.set_title(&format!(
                                "Fluidfall - {:.0} FPS ({:.2}ms) - {} particles",
                                fps,
                                frame_time,
                                gpu_state.simulation.particle_count()
                            ));
                        }
                        Err(wgpu::SurfaceError::Lost) => gpu_state.resize(window.inner_size()),
                        Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
                        Err(e) => eprintln!("Render error: {:?}", e),
                    }
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    // RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting fluidfall...");

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::default();
    event_loop.run_app(&mut app).unwrap();
}
