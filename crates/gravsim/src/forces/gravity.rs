//! Direct all-pairs gravity (O(N²))

use nalgebra::{Point2, Vector2};

use crate::forces::{gravity_accel, ForceModel};
use crate::particle::Particle;

/// Exact gravitational acceleration summed over every physical particle
///
/// A particle sitting exactly at the query position contributes zero, so the
/// querying particle needs no explicit exclusion.
///
/// Best for:
/// - Small sets
/// - Validating the Barnes-Hut approximation
#[derive(Debug, Clone, Copy)]
pub struct DirectGravity {
    pub gravitational_constant: f64,
    pub softening: f64,
}

impl DirectGravity {
    pub fn new(gravitational_constant: f64, softening: f64) -> Self {
        Self {
            gravitational_constant,
            softening,
        }
    }
}

impl ForceModel for DirectGravity {
    fn acceleration(&self, position: Point2<f64>, particles: &[Particle]) -> Vector2<f64> {
        particles
            .iter()
            .filter(|p| p.is_physical())
            .map(|p| {
                gravity_accel(
                    position,
                    p.position,
                    p.mass,
                    self.gravitational_constant,
                    self.softening,
                )
            })
            .fold(Vector2::zeros(), |acc, a| acc + a)
    }

    fn potential_energy(&self, particles: &[Particle]) -> f64 {
        let physical: Vec<&Particle> = particles.iter().filter(|p| p.is_physical()).collect();

        // Each pair counted once
        physical
            .iter()
            .enumerate()
            .flat_map(|(i, a)| {
                physical[i + 1..].iter().map(move |b| {
                    let r = ((a.position - b.position).magnitude_squared() + self.softening).sqrt();
                    -self.gravitational_constant * a.mass * b.mass / r
                })
            })
            .sum()
    }
}
