//! Error types for the simulation boundary.
//!
//! Only spawn-time validation, configuration and id lookups can fail. A running
//! tick never returns an error: numerical degeneracies are absorbed by epsilon
//! guards and capacity overflow degrades to oversized leaves.

use thiserror::Error;

use crate::particle::ParticleId;

/// Errors raised at the public boundary of [`Simulation`](crate::simulation::Simulation)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A particle was described with a non-finite coordinate or a
    /// non-positive mass or density. The particle is not inserted.
    #[error("invalid particle {field}: {value}")]
    InvalidParticle { field: &'static str, value: f64 },

    /// The live set already holds the configured maximum number of particles
    #[error("particle limit of {limit} reached")]
    ParticleLimit { limit: usize },

    /// The id does not refer to a live particle
    #[error("no live particle with id {0}")]
    UnknownParticle(ParticleId),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
