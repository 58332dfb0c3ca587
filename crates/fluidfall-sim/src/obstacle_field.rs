//! Obstacle field on the GPU: the CPU grid from `fluidfall-core` plus the
//! texture both the compute step and the overlay renderer bind.

use fluidfall_core::ObstacleGrid;
use glam::Vec2;

pub struct ObstacleField {
    grid: ObstacleGrid,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ObstacleField {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Obstacle Field Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::info!("Obstacle field: {width}x{height} texels");

        Self {
            grid: ObstacleGrid::new(width, height),
            texture,
            view,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.grid.width(), self.grid.height())
    }

    /// Commit a permanent brush stroke. `center` is normalized `[0,1]^2`,
    /// `brush` a normalized half-extent.
    pub fn paint_static(&mut self, center: Vec2, brush: f32) {
        self.grid.paint_static(center, brush);
    }

    /// Move the transient pointer disc. Called every frame the pointer is
    /// over the domain, pressed or not.
    pub fn set_mobile(&mut self, center: Vec2, brush: f32) {
        self.grid.set_mobile(center, brush);
    }

    /// Drop every committed stroke.
    pub fn clear(&mut self) {
        self.grid.clear();
    }

    /// Upload whatever changed since the last frame. Must run before the
    /// simulation step that reads the field, never between its dispatches.
    pub fn upload(&mut self, queue: &wgpu::Queue) {
        let Some(rect) = self.grid.take_dirty() else {
            return;
        };

        let width = self.grid.width();
        let texels = self.grid.texels();
        let mut scratch = Vec::with_capacity((rect.width() * rect.height() * 4) as usize);
        for y in rect.y0..rect.y1 {
            let row = (y * width + rect.x0) as usize;
            let row_texels = &texels[row..row + rect.width() as usize];
            scratch.extend_from_slice(bytemuck::cast_slice(row_texels));
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x0,
                    y: rect.y0,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &scratch,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(rect.width() * 4),
                rows_per_image: Some(rect.height()),
            },
            wgpu::Extent3d {
                width: rect.width(),
                height: rect.height(),
                depth_or_array_layers: 1,
            },
        );
    }
}
