//! Interactive 2D N-body gravity simulation core.
//!
//! Particles attract each other through a Barnes-Hut quadtree, advance with
//! velocity-Verlet inside a walled square world, and merge or bounce when
//! they touch. [`simulation::Simulation`] is the entry point.

pub mod arena_quadtree;
pub mod collisions;
pub mod config;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod particle;
pub mod scenario;
pub mod simulation;
pub mod spatial_grid;

pub use config::SimulationConfig;
pub use error::{Result, SimError};
pub use particle::{Particle, ParticleId, ParticleState};
pub use simulation::{FrameReport, Simulation, StepReport};

#[cfg(test)]
mod simulation_test;
