//! CPU-side core of the fluidfall simulation.
//!
//! Everything in here is plain math with no GPU dependency: domain constants,
//! the particle layout shared with WGSL, the obstacle grid that backs the
//! obstacle texture, the separable blur kernel, and a reference version of the
//! per-particle step that the compute shader implements. The reference step is
//! what the test-suite exercises.

pub mod domain;
pub mod hash;
pub mod kernel;
pub mod obstacle;
pub mod particle;
pub mod step;
pub mod surface;

pub use domain::SimulationDomain;
pub use kernel::{blur_weights, MAX_KERNEL_SIZE};
pub use obstacle::{ObstacleGrid, OBSTACLE_THRESHOLD};
pub use particle::Particle;
pub use step::{step_particle, StepParams};
