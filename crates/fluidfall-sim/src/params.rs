//! Per-frame simulation parameters uploaded to the compute shader.

use bytemuck::{Pod, Zeroable};
use fluidfall_core::SimulationDomain;

/// Matches the WGSL `SimParams` uniform block (48 bytes, 16-aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct SimParams {
    /// Clamped frame delta, already scaled by the global speed multiplier.
    pub dt: f32,
    /// Gravitational acceleration magnitude, applied straight down.
    pub gravity: f32,
    pub max_speed: f32,
    pub bandwidth: f32,

    /// Visible domain extent in world units.
    pub domain: [f32; 2],
    /// Obstacle texture size in texels.
    pub grid_size: [f32; 2],

    pub particle_count: u32,
    pub _pad: [u32; 3],
}

impl SimParams {
    pub fn new(
        domain: &SimulationDomain,
        grid_size: (u32, u32),
        particle_count: u32,
        dt: f32,
        gravity: f32,
    ) -> Self {
        Self {
            dt,
            gravity,
            max_speed: domain.max_speed,
            bandwidth: domain.bandwidth,
            domain: [domain.width, domain.height],
            grid_size: [grid_size.0 as f32, grid_size.1 as f32],
            particle_count,
            _pad: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_layout() {
        assert_eq!(std::mem::size_of::<SimParams>(), 48);
    }
}
