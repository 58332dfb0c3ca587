//! Catppuccin Mocha colors used by the renderers.

use catppuccin::PALETTE;

fn to_linear(c: u8) -> f64 {
    let srgb = c as f64 / 255.0;
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

fn color_to_wgpu(color: catppuccin::Color) -> wgpu::Color {
    wgpu::Color {
        r: to_linear(color.rgb.r),
        g: to_linear(color.rgb.g),
        b: to_linear(color.rgb.b),
        a: 1.0,
    }
}

fn color_to_array(color: catppuccin::Color) -> [f32; 4] {
    let c = color_to_wgpu(color);
    [c.r as f32, c.g as f32, c.b as f32, 1.0]
}

/// Window clear color (Mocha base).
pub fn background() -> wgpu::Color {
    color_to_wgpu(PALETTE.mocha.colors.base)
}

/// Flat obstacle overlay color (Mocha overlay).
pub fn obstacle() -> [f32; 4] {
    color_to_array(PALETTE.mocha.colors.overlay1)
}
