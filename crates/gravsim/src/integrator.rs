//! Velocity-Verlet time integration
//!
//! A tick advances a particle in two halves around a force evaluation:
//!
//! 1. Drift: x(t + dt) = x(t) + v(t)·dt + ½·a(t)·dt²
//! 2. (new accelerations a(t + dt) are computed from the drifted positions)
//! 3. Kick: v(t + dt) = v(t) + ½·(a(t) + a(t + dt))·dt
//!
//! Velocity-Verlet is symplectic and second order, so orbits keep their
//! energy over long runs. The drift also reflects particles off the walls of
//! the square world.

use nalgebra::Vector2;

use crate::particle::Particle;

/// Per-axis outcome of a wall check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContact {
    pub x: bool,
    pub y: bool,
}

impl WallContact {
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

/// Position half of the step, followed by wall reflection.
///
/// Records the start-of-tick position in `previous_position`.
///
/// # Examples
///
/// ```
/// use gravsim::integrator::drift;
/// use gravsim::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let mut p = Particle::new(ParticleId(0), Point2::new(0.0, 0.0), Vector2::new(10.0, 0.0), 1.0, 1.0, (1.0, 50.0));
/// p.acceleration = Vector2::new(0.0, 2.0);
///
/// drift(&mut p, 0.5, 1000.0);
///
/// assert_eq!(p.position.x, 5.0);
/// assert_eq!(p.position.y, 0.25);
/// assert_eq!(p.previous_position.x, 0.0);
/// ```
pub fn drift(particle: &mut Particle, dt: f64, half_extent: f64) -> WallContact {
    particle.previous_position = particle.position;
    particle.position += particle.velocity * dt + particle.acceleration * (0.5 * dt * dt);
    reflect_off_walls(particle, half_extent)
}

/// Clamps a particle inside `[-h, h]²` and negates the velocity component of
/// every axis on which its edge crossed a wall.
///
/// A particle larger than the world is centred on the offending axis.
pub fn reflect_off_walls(particle: &mut Particle, half_extent: f64) -> WallContact {
    let radius = particle.radius;
    let mut contact = WallContact::default();

    if let Some(x) = clamp_axis(particle.position.x, radius, half_extent) {
        particle.position.x = x;
        particle.velocity.x = -particle.velocity.x;
        contact.x = true;
    }
    if let Some(y) = clamp_axis(particle.position.y, radius, half_extent) {
        particle.position.y = y;
        particle.velocity.y = -particle.velocity.y;
        contact.y = true;
    }

    contact
}

/// Clamped center coordinate if the circle's edge crossed a wall
fn clamp_axis(center: f64, radius: f64, half_extent: f64) -> Option<f64> {
    let limit = half_extent - radius;
    if limit <= 0.0 {
        return (center != 0.0).then_some(0.0);
    }
    if center > limit {
        Some(limit)
    } else if center < -limit {
        Some(-limit)
    } else {
        None
    }
}

/// Velocity half of the step. `new_acceleration` becomes the particle's
/// stored acceleration for the next drift.
pub fn kick(particle: &mut Particle, new_acceleration: Vector2<f64>, dt: f64) {
    particle.velocity += (particle.acceleration + new_acceleration) * (0.5 * dt);
    particle.acceleration = new_acceleration;
}

/// Drift, evaluate, kick for a single isolated particle.
///
/// The simulation interleaves these phases across all particles; this helper
/// is the one-particle form, for external force fields.
pub fn step<F>(particle: &mut Particle, dt: f64, half_extent: f64, acceleration_at: F) -> WallContact
where
    F: FnOnce(&Particle) -> Vector2<f64>,
{
    let contact = drift(particle, dt, half_extent);
    let new_acceleration = acceleration_at(particle);
    kick(particle, new_acceleration, dt);
    contact
}
