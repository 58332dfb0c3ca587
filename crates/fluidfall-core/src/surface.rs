//! Reference math for the fluid surface shading pass.
//!
//! Mirrors the decisions `shaders/surface.wgsl` makes per pixel, so the
//! threshold/shading contract can be tested without a GPU.

use glam::{Vec2, Vec3};

/// Threshold compositing: a pixel whose blurred alpha falls below the cutoff
/// produces no surface at all; everything at or above it is shaded.
pub fn covers_surface(alpha: f32, threshold: f32) -> bool {
    alpha >= threshold
}

/// Estimate the screen-space surface normal from the alpha gradient.
///
/// `gradient` is the texel-difference gradient of the blurred alpha field;
/// `bump` scales how steep the resulting surface appears.
pub fn estimate_normal(gradient: Vec2, bump: f32) -> Vec3 {
    Vec3::new(-gradient.x * bump, -gradient.y * bump, 1.0).normalize()
}

/// Blinn-Phong style highlight against a fixed light direction.
pub fn specular_term(normal: Vec3, light_dir: Vec3, shininess: f32) -> f32 {
    normal.dot(light_dir.normalize()).max(0.0).powf(shininess)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_below_threshold_is_discarded() {
        assert!(!covers_surface(0.29, 0.3));
        assert!(!covers_surface(0.0, 0.3));
        assert!(covers_surface(0.3, 0.3));
        assert!(covers_surface(1.0, 0.3));
    }

    #[test]
    fn flat_field_has_straight_up_normal() {
        let n = estimate_normal(Vec2::ZERO, 4.0);
        assert!((n - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn normal_tilts_against_the_gradient() {
        // Alpha rising to the right tilts the surface normal to the left.
        let n = estimate_normal(Vec2::new(0.5, 0.0), 4.0);
        assert!(n.x < 0.0);
        assert!(n.z > 0.0);
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn specular_peaks_when_facing_the_light() {
        let light = Vec3::new(0.0, 0.0, 1.0);
        let head_on = specular_term(Vec3::Z, light, 32.0);
        let tilted = specular_term(estimate_normal(Vec2::new(1.0, 0.0), 4.0), light, 32.0);
        assert!((head_on - 1.0).abs() < 1e-6);
        assert!(tilted < head_on);
        // Facing away contributes nothing.
        assert_eq!(specular_term(-Vec3::Z, light, 32.0), 0.0);
    }
}
