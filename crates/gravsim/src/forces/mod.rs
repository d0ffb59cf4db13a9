//! Gravitational force models.
//!
//! Both models share one softened kernel, [`gravity_accel`]:
//!
//! ```text
//! a = G · m · Δ / (|Δ|² + ε)^(3/2)
//! ```
//!
//! [`DirectGravity`] sums it over every particle and serves as the exact
//! reference. [`TreeGravity`] sums it over the pseudo-particles returned by a
//! Barnes-Hut query and is what the simulation uses by default.

use nalgebra::{Point2, Vector2};

use crate::particle::Particle;

pub mod gravity;
pub mod tree_gravity;


pub use gravity::DirectGravity;
pub use tree_gravity::TreeGravity;

/// A source of acceleration on particles
///
/// # Examples
///
/// ```
/// use gravsim::forces::{DirectGravity, ForceModel};
/// use gravsim::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let particles = vec![
///     Particle::new(ParticleId(0), Point2::new(0.0, 0.0), Vector2::zeros(), 100.0, 1.0, (1.0, 50.0)),
///     Particle::new(ParticleId(1), Point2::new(10.0, 0.0), Vector2::zeros(), 1.0, 1.0, (1.0, 50.0)),
/// ];
///
/// let gravity = DirectGravity::new(1.0, 1e-5);
/// let accel = gravity.acceleration(particles[1].position, &particles);
///
/// // Pulled toward the heavy particle
/// assert!(accel.x < 0.0);
/// ```
pub trait ForceModel: Send + Sync {
    /// Acceleration felt by a test mass at `position`
    fn acceleration(&self, position: Point2<f64>, particles: &[Particle]) -> Vector2<f64>;

    /// Potential energy of the whole set (optional)
    fn potential_energy(&self, _particles: &[Particle]) -> f64 {
        0.0
    }
}

/// Softened Newtonian acceleration at `from` toward a point mass at `toward`.
///
/// Coincident points give exactly zero.
#[inline]
pub fn gravity_accel(
    from: Point2<f64>,
    toward: Point2<f64>,
    mass: f64,
    gravitational_constant: f64,
    softening: f64,
) -> Vector2<f64> {
    let diff = toward - from;
    let dist_sq = diff.magnitude_squared() + softening;
    diff * (gravitational_constant * mass / (dist_sq * dist_sq.sqrt()))
}
