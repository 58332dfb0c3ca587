//! Deterministic fract-sin hash used for reinjection jitter.
//!
//! Not a statistically validated random source; it only has to decorrelate
//! respawn positions, and it must be reproducible in both Rust and WGSL.
//! The whole simulation stays a deterministic function of its initial state.

use glam::Vec2;

/// `fract(sin(dot(seed, (12.9898, 78.233)) + lane) * 43758.5453)`.
///
/// `lane` separates the independent draws taken from one particle's state
/// within a single step.
pub fn hash21(seed: Vec2, lane: f32) -> f32 {
    let s = (seed.dot(Vec2::new(12.9898, 78.233)) + lane).sin() * 43758.5453;
    s - s.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_unit_interval() {
        for i in 0..500 {
            let seed = Vec2::new(i as f32 * 0.371, -(i as f32) * 1.77);
            for lane in 0..4 {
                let h = hash21(seed, lane as f32);
                assert!((0.0..1.0).contains(&h), "seed={seed:?} lane={lane} h={h}");
            }
        }
    }

    #[test]
    fn deterministic_for_equal_inputs() {
        let seed = Vec2::new(1.25, -3.5);
        assert_eq!(hash21(seed, 2.0), hash21(seed, 2.0));
        assert_ne!(hash21(seed, 0.0), hash21(seed, 1.0));
    }
}
