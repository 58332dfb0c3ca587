use egui::Context;
use egui_wgpu::Renderer;
use egui_winit::State;
use fluidfall_core::MAX_KERNEL_SIZE;
use fluidfall_render::{ObstacleDisplay, RenderMode};
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

/// Population sizes offered in the UI. Changing the count rebuilds both
/// particle generations from scratch.
pub const PARTICLE_COUNT_CHOICES: [u32; 4] = [4096, 16384, 65536, 262144];

pub struct UiState {
    pub fps: f32,
    pub frame_time: f32,

    pub particle_count: u32,
    pub gravity: f32,
    pub speed_multiplier: f32,
    pub is_paused: bool,

    pub render_mode: RenderMode,
    pub point_size: f32,

    pub kernel_size: usize,
    pub blur_threshold: f32,
    pub bump: f32,
    pub shininess: f32,
    pub specular: bool,
    pub show_normals: bool,

    pub brush_size: f32,
    pub show_obstacles: bool,
    pub obstacle_display: ObstacleDisplay,

    pub reset_requested: bool,
    pub clear_obstacles_requested: bool,
    pub kernel_dirty: bool,
    pub shading_dirty: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time: 0.0,

            particle_count: 65536,
            gravity: 9.8,
            speed_multiplier: 1.0,
            is_paused: false,

            render_mode: RenderMode::Fluid,
            point_size: 3.0,

            kernel_size: 15,
            blur_threshold: 0.5,
            bump: 30.0,
            shininess: 32.0,
            specular: true,
            show_normals: false,

            brush_size: 0.04,
            show_obstacles: true,
            obstacle_display: ObstacleDisplay::Solid,

            reset_requested: false,
            clear_obstacles_requested: false,
            // Both start dirty so the first frame uploads real parameters.
            kernel_dirty: true,
            shading_dirty: true,
        }
    }
}

pub struct Gui {
    context: Context,
    state: State,
    renderer: Renderer,
}

impl Gui {
    pub fn new(device: &Device, output_color_format: TextureFormat, window: &Window) -> Self {
        let context = Context::default();
        let id = context.viewport_id();

        let state = State::new(
            context.clone(),
            id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );

        let renderer = Renderer::new(
            device,
            output_color_format,
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                ..Default::default()
            },
        );

        Self {
            context,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    pub fn render(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        ui_state: &mut UiState,
    ) {
        let raw_input = self.state.take_egui_input(window);

        let full_output = self.context.run(raw_input, |ctx| {
            Self::ui(ctx, ui_state);
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Egui Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        // SAFETY: Workaround for lifetime issues with egui-wgpu render pass
        let render_pass: &mut wgpu::RenderPass<'static> =
            unsafe { std::mem::transmute(&mut render_pass) };

        self.renderer
            .render(render_pass, &clipped_primitives, &screen_descriptor);

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn ui(ctx: &Context, state: &mut UiState) {
        // Diagnostics Panel (Top Left)
        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", state.fps));
                ui.label(format!("Frame Time: {:.2} ms", state.frame_time));
                ui.label(format!("Particles: {}", state.particle_count));
            });

        // Simulation Controls (Top Right)
        egui::Window::new("Simulation")
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                let before = state.particle_count;
                egui::ComboBox::from_label("Particle Count")
                    .selected_text(format!("{}", state.particle_count))
                    .show_ui(ui, |ui| {
                        for count in PARTICLE_COUNT_CHOICES {
                            ui.selectable_value(
                                &mut state.particle_count,
                                count,
                                format!("{count}"),
                            );
                        }
                    });
                if state.particle_count != before {
                    state.reset_requested = true;
                }

                ui.add(egui::Slider::new(&mut state.gravity, 0.0..=50.0).text("Gravity"));
                ui.add(
                    egui::Slider::new(&mut state.speed_multiplier, 0.0..=4.0)
                        .text("Speed Multiplier"),
                );
                ui.checkbox(&mut state.is_paused, "Pause");

                ui.separator();
                ui.heading("Obstacles");
                ui.add(
                    egui::Slider::new(&mut state.brush_size, 0.005..=0.2)
                        .text("Brush Size")
                        .logarithmic(true),
                );
                ui.checkbox(&mut state.show_obstacles, "Show Obstacles");
                ui.horizontal(|ui| {
                    ui.selectable_value(
                        &mut state.obstacle_display,
                        ObstacleDisplay::Solid,
                        "Solid",
                    );
                    ui.selectable_value(
                        &mut state.obstacle_display,
                        ObstacleDisplay::Normals,
                        "Normals",
                    );
                });

                ui.separator();
                if ui.button("Reset Particles").clicked() {
                    state.reset_requested = true;
                }
                if ui.button("Clear Obstacles").clicked() {
                    state.clear_obstacles_requested = true;
                }
            });

        // Rendering Controls (Bottom Left)
        egui::Window::new("Rendering")
            .anchor(egui::Align2::LEFT_BOTTOM, [10.0, -10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.selectable_value(&mut state.render_mode, RenderMode::Points, "Points");
                    ui.selectable_value(&mut state.render_mode, RenderMode::Fluid, "Fluid");
                });
                ui.add(egui::Slider::new(&mut state.point_size, 1.0..=16.0).text("Point Size"));

                if state.render_mode == RenderMode::Fluid {
                    ui.separator();
                    ui.heading("Fluid Surface");
                    if ui
                        .add(
                            egui::Slider::new(&mut state.kernel_size, 1..=MAX_KERNEL_SIZE)
                                .text("Blur Kernel"),
                        )
                        .changed()
                    {
                        state.kernel_dirty = true;
                    }

                    let mut changed = false;
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut state.blur_threshold, 0.0..=2.0)
                                .text("Threshold"),
                        )
                        .changed();
                    changed |= ui
                        .add(egui::Slider::new(&mut state.bump, 0.0..=200.0).text("Bump"))
                        .changed();
                    changed |= ui
                        .add(egui::Slider::new(&mut state.shininess, 1.0..=128.0).text("Shininess"))
                        .changed();
                    changed |= ui.checkbox(&mut state.specular, "Specular").changed();
                    changed |= ui.checkbox(&mut state.show_normals, "Show Normals").changed();
                    if changed {
                        state.shading_dirty = true;
                    }
                }
            });
    }
}
