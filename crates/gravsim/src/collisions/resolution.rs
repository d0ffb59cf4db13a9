//! Collision resolution: inelastic merging and elastic bouncing
//!
//! A merge conserves:
//! - Total mass: m_new = m_a + m_b
//! - Momentum: p_new = p_a + p_b
//!
//! and keeps the heavier particle's position. The merged density is the
//! total mass over the total area of the two disks, clamped to the configured
//! range, and the radius is derived from the new mass and density.

use nalgebra::Vector2;

use crate::collisions::detection::advance;
use crate::config::SimulationConfig;
use crate::particle::Particle;

/// Density and radius ranges applied to merge products
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialLimits {
    pub min_density: f64,
    pub max_density: f64,
    pub min_radius: f64,
    pub max_radius: f64,
}

impl From<&SimulationConfig> for MaterialLimits {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            min_density: config.min_density,
            max_density: config.max_density,
            min_radius: config.min_radius,
            max_radius: config.max_radius,
        }
    }
}

/// Whether `a` survives a merge with `b`
///
/// The heavier particle survives; on equal mass the lower id does. Both sides
/// of a pair evaluate this to complementary answers, so only one of them
/// ever commits the merge.
pub fn merge_survivor(a: &Particle, b: &Particle) -> bool {
    if a.mass != b.mass {
        a.mass > b.mass
    } else {
        a.id < b.id
    }
}

/// Area-weighted density of the union of two disks, clamped to `[min, max]`
pub fn combined_density(a: &Particle, b: &Particle, min_density: f64, max_density: f64) -> f64 {
    let area = a.area() + b.area();
    if area > 0.0 {
        ((a.mass + b.mass) / area).clamp(min_density, max_density)
    } else {
        a.density.clamp(min_density, max_density)
    }
}

/// Merges two particles in place and returns `true` if `a` is the survivor
///
/// The survivor takes the total mass, the momentum-weighted velocity and the
/// combined density, and keeps its own position; the other particle is marked
/// dead. A particle that is not moving this tick, such as a frozen one,
/// brings mass but no momentum.
///
/// # Examples
///
/// ```
/// use gravsim::collisions::{merge_particles, MaterialLimits};
/// use gravsim::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let limits = MaterialLimits { min_density: 0.1, max_density: 100.0, min_radius: 1.0, max_radius: 50.0 };
/// let mut a = Particle::new(ParticleId(0), Point2::new(0.0, 0.0), Vector2::new(0.0, 5.0), 1.0, 1.0, (1.0, 50.0));
/// let mut b = Particle::new(ParticleId(1), Point2::new(1.0, 0.0), Vector2::new(0.0, 2.0), 2.0, 1.0, (1.0, 50.0));
///
/// let a_survived = merge_particles(&mut a, &mut b, &limits);
///
/// assert!(!a_survived);
/// assert!(!a.alive);
/// assert_eq!(b.mass, 3.0);
/// assert!((b.velocity.y - 3.0).abs() < 1e-12);
/// ```
pub fn merge_particles(a: &mut Particle, b: &mut Particle, limits: &MaterialLimits) -> bool {
    let a_survives = merge_survivor(a, b);
    let (survivor, absorbed) = if a_survives { (a, b) } else { (b, a) };

    let total_mass = survivor.mass + absorbed.mass;
    let momentum = survivor.motion() * survivor.mass + absorbed.motion() * absorbed.mass;
    let velocity = momentum / total_mass;
    let density = combined_density(survivor, absorbed, limits.min_density, limits.max_density);

    survivor.mass = total_mass;
    survivor.velocity = velocity;
    survivor.density = density;
    survivor.refresh_radius(limits.min_radius, limits.max_radius);

    absorbed.alive = false;
    absorbed.velocity = Vector2::zeros();

    a_survives
}

/// Whether a particle resists being moved by a bounce
///
/// The simulation never offers a dragged particle as a collision partner;
/// the dragged case covers direct callers of [`bounce_particles`].
fn is_anchor(particle: &Particle) -> bool {
    particle.frozen || particle.is_dragged()
}

/// Elastic bounce at time of impact `t`
///
/// Both particles advance to their positions at `t`, then exchange impulse
/// along the contact normal. Residual overlap is removed by pushing them
/// apart: an anchor (frozen or dragged) does not move, a free particle facing
/// an anchor takes the whole correction, two free particles split it.
///
/// Returns `false` when the centers coincide and no normal exists; nothing is
/// changed beyond the advance to `t`.
pub fn bounce_particles(a: &mut Particle, b: &mut Particle, t: f64) -> bool {
    let anchor_a = is_anchor(a);
    let anchor_b = is_anchor(b);

    if !anchor_a {
        a.position = advance(a.position, a.velocity, t);
    }
    if !anchor_b {
        b.position = advance(b.position, b.velocity, t);
    }

    let offset = b.position - a.position;
    let dist_sq = offset.magnitude_squared();
    if dist_sq == 0.0 {
        return false;
    }
    let dist = dist_sq.sqrt();
    let normal = offset / dist;

    let inv_mass_a = if anchor_a { 0.0 } else { 1.0 / a.mass };
    let inv_mass_b = if anchor_b { 0.0 } else { 1.0 / b.mass };
    let inv_mass_sum = inv_mass_a + inv_mass_b;
    if inv_mass_sum == 0.0 {
        return false;
    }

    // Only approaching pairs exchange impulse
    let v_rel = (b.motion() - a.motion()).dot(&normal);
    if v_rel < 0.0 {
        // With both free this is v_a += 2·v_rel·m_b/(m_a+m_b)·n and
        // v_b -= 2·v_rel·m_a/(m_a+m_b)·n
        let impulse = 2.0 * v_rel / inv_mass_sum;
        a.velocity += normal * (impulse * inv_mass_a);
        b.velocity -= normal * (impulse * inv_mass_b);
    }

    let overlap = (a.radius + b.radius) - dist;
    if overlap > 0.0 {
        let movable_a = if anchor_a { 0.0 } else { 1.0 };
        let movable_b = if anchor_b { 0.0 } else { 1.0 };
        let total = movable_a + movable_b;
        a.position -= normal * (overlap * movable_a / total);
        b.position += normal * (overlap * movable_b / total);
    }

    true
}
