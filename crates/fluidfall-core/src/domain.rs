//! Domain geometry shared by the simulation and the renderers.

/// Fixed geometry of the visible world plus the constants derived from it.
///
/// All three derived values are fixed for the lifetime of a particle-count
/// configuration and only recomputed on a full reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationDomain {
    /// Visible width in world units.
    pub width: f32,
    /// Visible height in world units.
    pub height: f32,
    /// Horizontal wrap span, wider than the viewport so wrapped particles
    /// re-enter offscreen.
    pub bandwidth: f32,
    /// Hard speed ceiling in world units per second.
    pub max_speed: f32,
}

/// Bandwidth as a multiple of the larger visible dimension.
pub const BANDWIDTH_FACTOR: f32 = 1.2;

/// Max speed as a multiple of the larger visible dimension.
pub const MAX_SPEED_FACTOR: f32 = 0.5;

/// Fraction of max speed a particle keeps after bouncing off an obstacle.
pub const BOUNCE_SPEED_FRACTION: f32 = 0.1;

impl SimulationDomain {
    pub fn new(width: f32, height: f32) -> Self {
        let major = width.max(height);
        Self {
            width,
            height,
            bandwidth: BANDWIDTH_FACTOR * major,
            max_speed: MAX_SPEED_FACTOR * major,
        }
    }

    /// Lower edge of the visible domain; falling past it triggers reinjection.
    pub fn bottom(&self) -> f32 {
        -0.5 * self.height
    }

    /// Upper edge of the visible domain; reinjected particles respawn above it.
    pub fn top(&self) -> f32 {
        0.5 * self.height
    }

    /// Fold an x coordinate back into `[-bandwidth/2, bandwidth/2]`.
    ///
    /// A single fold is enough: no step moves a particle more than
    /// `0.1 * max_speed * dt` past the edge, which is far below one bandwidth.
    pub fn wrap_x(&self, x: f32) -> f32 {
        let half = 0.5 * self.bandwidth;
        if x > half {
            x - self.bandwidth
        } else if x < -half {
            x + self.bandwidth
        } else {
            x
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_constants_follow_major_dimension() {
        let d = SimulationDomain::new(16.0, 9.0);
        assert_eq!(d.bandwidth, 1.2 * 16.0);
        assert_eq!(d.max_speed, 0.5 * 16.0);

        let tall = SimulationDomain::new(9.0, 16.0);
        assert_eq!(tall.bandwidth, 1.2 * 16.0);
    }

    #[test]
    fn wrap_closes_over_bandwidth() {
        let d = SimulationDomain::new(10.0, 10.0);
        let half = 0.5 * d.bandwidth;
        for x in [-half - 3.0, -half, -1.0, 0.0, 4.0, half, half + 2.5] {
            let wrapped = d.wrap_x(x);
            assert!(wrapped >= -half - 1e-5 && wrapped <= half + 1e-5, "x={x} -> {wrapped}");
        }
    }

    #[test]
    fn wrap_is_identity_inside_band() {
        let d = SimulationDomain::new(10.0, 10.0);
        assert_eq!(d.wrap_x(3.0), 3.0);
        assert_eq!(d.wrap_x(-5.9), -5.9);
    }
}
