//! Rendering for the fluidfall simulation: raw points, the blurred fluid
//! surface, and the obstacle overlay.

mod compositor;
mod obstacle_renderer;
mod palette;
mod point_renderer;

pub use compositor::FluidCompositor;
pub use obstacle_renderer::{ObstacleDisplay, ObstacleRenderer};
pub use point_renderer::PointRenderer;

/// What the frame driver draws each frame. An explicit mode, selected per
/// frame; there is no rebindable render callback anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Raw particle points straight to the surface.
    Points,
    /// Particles splatted offscreen, blurred, thresholded, shaded.
    Fluid,
}
