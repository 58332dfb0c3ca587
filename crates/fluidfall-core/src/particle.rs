//! Particle state layout shared between CPU and WGSL.

use crate::domain::SimulationDomain;
use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::Rng;

/// GPU-compatible particle structure.
/// Aligned for WGSL struct compatibility (two vec2<f32>, 16 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position in world space, origin at the domain center.
    pub position: [f32; 2],
    /// Velocity in world units per second.
    pub velocity: [f32; 2],
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
        }
    }

    /// Uniformly random particle inside the visible domain with velocity in
    /// `±max_speed` per axis. Used at reset time only; everything after that
    /// is the deterministic step transform.
    pub fn random(domain: &SimulationDomain, rng: &mut impl Rng) -> Self {
        let x = (rng.random::<f32>() - 0.5) * domain.width;
        let y = (rng.random::<f32>() - 0.5) * domain.height;
        let vx = (rng.random::<f32>() * 2.0 - 1.0) * domain.max_speed;
        let vy = (rng.random::<f32>() * 2.0 - 1.0) * domain.max_speed;
        Self {
            position: [x, y],
            velocity: [vx, vy],
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn random_particles_start_inside_the_domain() {
        let domain = SimulationDomain::new(12.0, 8.0);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let p = Particle::random(&domain, &mut rng);
            assert!(p.position[0].abs() <= 0.5 * domain.width);
            assert!(p.position[1].abs() <= 0.5 * domain.height);
            assert!(p.velocity[0].abs() <= domain.max_speed);
            assert!(p.velocity[1].abs() <= domain.max_speed);
        }
    }

    #[test]
    fn layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<Particle>(), 16);
        assert_eq!(std::mem::align_of::<Particle>(), 4);
    }
}
