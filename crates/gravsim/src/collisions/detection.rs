//! Continuous collision detection for pairs of moving circles

use nalgebra::{Point2, Vector2};

use crate::particle::{Particle, ParticleId};

/// Squared relative speed below which two separated circles are treated as
/// relatively at rest
pub const RELATIVE_SPEED_EPSILON: f64 = 1e-5;

/// A detected contact between two particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub particle_a: ParticleId,
    pub particle_b: ParticleId,
    /// Time of first contact, in `[0, dt]`
    pub time_of_impact: f64,
}

impl CollisionEvent {
    /// Checks a pair of particles over one tick
    pub fn detect(a: &Particle, b: &Particle, dt: f64) -> Option<Self> {
        ccd(a, b, dt).map(|time_of_impact| CollisionEvent {
            particle_a: a.id,
            particle_b: b.id,
            time_of_impact,
        })
    }
}

/// Earliest time in `[0, dt]` at which two particles moving at constant
/// velocity touch, `None` if they do not touch this tick
///
/// Overlapping particles collide at `t = 0`. Particles the integrator does
/// not advance count as standing still, whatever velocity they hold.
///
/// # Examples
///
/// ```
/// use gravsim::collisions::ccd;
/// use gravsim::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let mut a = Particle::new(ParticleId(0), Point2::new(0.0, 0.0), Vector2::new(5.0, 0.0), 1.0, 1.0, (0.1, 100.0));
/// let mut b = Particle::new(ParticleId(1), Point2::new(20.0, 0.0), Vector2::new(-5.0, 0.0), 1.0, 1.0, (0.1, 100.0));
/// a.radius = 5.0;
/// b.radius = 5.0;
///
/// assert_eq!(ccd(&a, &b, 1.0), Some(1.0));
/// ```
pub fn ccd(a: &Particle, b: &Particle, dt: f64) -> Option<f64> {
    time_of_impact(
        a.position - b.position,
        a.motion() - b.motion(),
        a.radius + b.radius,
        dt,
    )
}

/// Solves `|Δp + t·Δv|² = R²` for the smallest root in `[0, dt]`
///
/// * `delta_p` - relative position `p_a - p_b`
/// * `delta_v` - relative velocity `v_a - v_b`
/// * `combined_radius` - `r_a + r_b`
pub fn time_of_impact(
    delta_p: Vector2<f64>,
    delta_v: Vector2<f64>,
    combined_radius: f64,
    dt: f64,
) -> Option<f64> {
    let r_sq = combined_radius * combined_radius;
    let p_dot_p = delta_p.magnitude_squared();

    if p_dot_p < r_sq {
        return Some(0.0);
    }

    let v_dot_v = delta_v.magnitude_squared();
    if v_dot_v < RELATIVE_SPEED_EPSILON {
        return None;
    }

    let a = v_dot_v;
    let b = 2.0 * delta_p.dot(&delta_v);
    let c = p_dot_p - r_sq;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_disc = discriminant.sqrt();
    let t1 = (-b - sqrt_disc) / (2.0 * a);
    let t2 = (-b + sqrt_disc) / (2.0 * a);

    [t1, t2].into_iter().find(|t| (0.0..=dt).contains(t))
}

/// Position of a point after moving at constant velocity for `t`
pub fn advance(position: Point2<f64>, velocity: Vector2<f64>, t: f64) -> Point2<f64> {
    position + velocity * t
}
