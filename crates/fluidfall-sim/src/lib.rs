//! GPU-resident particle simulation: double-buffered particle state advanced
//! by a compute shader against the obstacle field texture.

mod obstacle_field;
mod params;
mod simulation;

pub use obstacle_field::ObstacleField;
pub use params::SimParams;
pub use simulation::ParticleSimulation;
