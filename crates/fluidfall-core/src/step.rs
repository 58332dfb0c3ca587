//! Reference implementation of the per-particle step.
//!
//! The compute shader in `fluidfall-sim` (`shaders/step.wgsl`) implements
//! exactly this transform; this CPU version is the oracle the test-suite runs
//! against. Each particle is advanced independently from its own prior state
//! and read-only field lookups, which is what allows the GPU to run the whole
//! generation as one parallel batch.

use crate::domain::{SimulationDomain, BOUNCE_SPEED_FRACTION};
use crate::hash::hash21;
use crate::obstacle::ObstacleGrid;
use crate::particle::Particle;
use glam::Vec2;

/// Per-step knobs supplied by the frame driver.
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    /// Gravitational acceleration magnitude, applied straight down.
    pub gravity: f32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self { gravity: 9.8 }
    }
}

/// Fraction of max speed used for reinjection jitter.
const REINJECT_SPEED_FRACTION: f32 = 0.25;

/// Advance one particle by `dt` seconds against the composited obstacle field.
///
/// Pure function of the particle's prior state: field lookups are read-only
/// and no particle's write depends on another particle's result.
pub fn step_particle(
    p: Particle,
    dt: f32,
    domain: &SimulationDomain,
    params: &StepParams,
    grid: &ObstacleGrid,
) -> Particle {
    let pos = p.position();
    let vel = p.velocity();

    let mut next_vel = vel + dt * Vec2::new(0.0, -params.gravity);

    // Reinjection: a particle that fell out of the visible world gets a fresh
    // hashed velocity; its slot is recycled, never removed.
    let seed = pos + vel;
    let reinjected = pos.y < domain.bottom();
    if reinjected {
        next_vel = Vec2::new(
            (hash21(seed, 0.0) - 0.5) * REINJECT_SPEED_FRACTION * domain.max_speed,
            -hash21(seed, 1.0) * REINJECT_SPEED_FRACTION * domain.max_speed,
        );
    }

    // Collision against the field at the *current* position: reflect about the
    // surface normal when moving into it, then kill most of the speed. A lossy
    // bounce, not an elastic one.
    let n = grid.sample(pos, domain);
    if ObstacleGrid::is_obstacle(n) {
        let n_hat = n.normalize();
        if next_vel.dot(n_hat) < 0.0 {
            next_vel -= 2.0 * next_vel.dot(n_hat) * n_hat;
            let cap = BOUNCE_SPEED_FRACTION * domain.max_speed;
            let speed = next_vel.length();
            if speed > cap {
                next_vel *= cap / speed;
            }
        }
    }

    // Hard speed ceiling regardless of what happened above.
    let speed = next_vel.length();
    if speed > domain.max_speed {
        next_vel *= domain.max_speed / speed;
    }

    let mut next_pos = pos + dt * next_vel;

    // Penetration correction: a first-order nudge out along the normal at the
    // new position. Reduces tunneling; does not guarantee its absence.
    let n = grid.sample(next_pos, domain);
    if ObstacleGrid::is_obstacle(n) {
        next_pos += dt * n;
    }

    // Respawn offscreen-above, spread across the visible width.
    if reinjected {
        next_pos.x = (hash21(seed, 2.0) - 0.5) * domain.width;
        next_pos.y = domain.top()
            + (0.1 + 0.9 * hash21(seed, 3.0)) * 0.5 * (domain.bandwidth - domain.height);
    }

    // Toroidal wrap on x only; y is bounded by reinjection.
    next_pos.x = domain.wrap_x(next_pos.x);

    Particle::new(next_pos, next_vel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_grid() -> ObstacleGrid {
        ObstacleGrid::new(256, 256)
    }

    fn domain() -> SimulationDomain {
        SimulationDomain::new(10.0, 10.0)
    }

    #[test]
    fn speed_never_exceeds_the_ceiling() {
        let domain = domain();
        let grid = empty_grid();
        let params = StepParams { gravity: 50.0 };

        for i in 0..200 {
            let p = Particle::new(
                Vec2::new(i as f32 * 0.03 - 3.0, (i % 17) as f32 * 0.5 - 4.0),
                Vec2::new((i % 13) as f32 * 2.0 - 12.0, (i % 7) as f32 * 3.0 - 9.0),
            );
            for dt in [0.0, 0.004, 0.016, 0.05, 0.1] {
                let next = step_particle(p, dt, &domain, &params, &grid);
                assert!(
                    next.velocity().length() <= domain.max_speed + 1e-4,
                    "dt={dt} p={p:?} -> {next:?}"
                );
            }
        }
    }

    #[test]
    fn fallen_particles_respawn_above_the_domain() {
        let domain = domain();
        let grid = empty_grid();
        let params = StepParams::default();

        for i in 0..100 {
            let p = Particle::new(
                Vec2::new(i as f32 * 0.1 - 5.0, domain.bottom() - 0.01 - i as f32 * 0.05),
                Vec2::new(0.3, -2.0),
            );
            let next = step_particle(p, 0.016, &domain, &params, &grid);
            let pos = next.position();
            assert!(pos.y > domain.top(), "respawn below top: {pos:?}");
            assert!(pos.x.abs() <= 0.5 * domain.width, "respawn outside width: {pos:?}");
        }
    }

    #[test]
    fn wrap_keeps_x_inside_the_bandwidth() {
        let domain = domain();
        let grid = empty_grid();
        let params = StepParams::default();
        let half_band = 0.5 * domain.bandwidth;

        // Start right at the band edge moving outward at full speed.
        for sign in [-1.0_f32, 1.0] {
            let p = Particle::new(
                Vec2::new(sign * (half_band - 0.01), 0.0),
                Vec2::new(sign * domain.max_speed, 0.0),
            );
            let next = step_particle(p, 0.1, &domain, &params, &grid);
            let x = next.position().x;
            assert!((-half_band..=half_band).contains(&x), "x={x}");
        }
    }

    #[test]
    fn bounce_reflects_and_loses_energy() {
        let domain = domain();
        let params = StepParams { gravity: 0.0 };

        // Solid disc in the middle of the domain; probe its right edge where
        // the outward normal is +x.
        let mut grid = ObstacleGrid::new(512, 512);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);

        let p = Particle::new(Vec2::new(0.45, 0.0), Vec2::new(-domain.max_speed, 0.0));
        let next = step_particle(p, 0.016, &domain, &params, &grid);
        let v = next.velocity();
        let n = grid.sample(p.position(), &domain).normalize();

        assert!(v.dot(n) >= 0.0, "still moving into the surface: v={v:?} n={n:?}");
        assert!(
            v.length() <= BOUNCE_SPEED_FRACTION * domain.max_speed + 1e-4,
            "bounce kept too much speed: |v|={}",
            v.length()
        );
    }

    #[test]
    fn grazing_velocity_is_not_reflected() {
        let domain = domain();
        let params = StepParams { gravity: 0.0 };
        let mut grid = ObstacleGrid::new(512, 512);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);

        // Moving away from the surface: the bounce branch must not trigger.
        let p = Particle::new(Vec2::new(0.45, 0.0), Vec2::new(1.0, 0.0));
        let next = step_particle(p, 0.016, &domain, &params, &grid);
        assert!(next.velocity().x > 0.9, "outgoing velocity was damped: {next:?}");
    }

    #[test]
    fn penetration_nudge_pushes_out_along_the_normal() {
        let domain = domain();
        let params = StepParams { gravity: 0.0 };
        let mut grid = ObstacleGrid::new(512, 512);
        grid.paint_static(Vec2::new(0.5, 0.5), 0.05);

        // Stationary particle already inside the disc, right half: the nudge
        // moves it further +x, by dt * n.
        let p = Particle::new(Vec2::new(0.3, 0.0), Vec2::ZERO);
        let next = step_particle(p, 0.016, &domain, &params, &grid);
        assert!(next.position().x > 0.3, "expected +x nudge: {next:?}");
    }

    #[test]
    fn free_fall_is_plain_integration() {
        // Zero gravity, zero obstacles: one step is position + dt * velocity.
        let domain = domain();
        let grid = empty_grid();
        let params = StepParams { gravity: 0.0 };
        let dt = 0.016;

        for i in 0..256 {
            let p = Particle::new(
                Vec2::new((i % 16) as f32 * 0.5 - 3.75, (i / 16) as f32 * 0.5 - 3.75),
                Vec2::new((i % 5) as f32 - 2.0, (i % 3) as f32 - 1.0),
            );
            let next = step_particle(p, dt, &domain, &params, &grid);
            let expected = p.position() + dt * p.velocity();
            assert!(
                (next.position() - expected).length() < 1e-6,
                "i={i} got {:?} expected {expected:?}",
                next.position()
            );
            assert_eq!(next.velocity(), p.velocity());
        }
    }

    #[test]
    fn step_is_deterministic() {
        let domain = domain();
        let grid = empty_grid();
        let params = StepParams::default();
        let p = Particle::new(Vec2::new(1.0, domain.bottom() - 0.5), Vec2::new(0.2, -3.0));

        let a = step_particle(p, 0.016, &domain, &params, &grid);
        let b = step_particle(p, 0.016, &domain, &params, &grid);
        assert_eq!(a, b);
    }
}
