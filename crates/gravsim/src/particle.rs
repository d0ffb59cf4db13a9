use std::f64::consts::PI;
use std::fmt;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Smallest density used when deriving a radius
const DENSITY_FLOOR: f64 = 1e-9;

/// Stable identity of a particle. Ids are never reused within a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interaction mode of a particle
///
/// `Free` and `Dragged` toggle on user input; `InMenu` is the physics-inert
/// preview used while a particle is being configured. Death is tracked by
/// [`Particle::alive`] and is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleState {
    Free,
    Dragged,
    InMenu,
}

/// Radius of a disk of the given mass and areal density, clamped to
/// `[min_radius, max_radius]`
///
/// Area is `mass / density`, so `r = sqrt(mass / (density * π))`.
///
/// # Examples
///
/// ```
/// use gravsim::particle::radius_for;
///
/// let r = radius_for(std::f64::consts::PI * 100.0, 1.0, 1.0, 50.0);
/// assert!((r - 10.0).abs() < 1e-12);
///
/// // Clamped at both ends
/// assert_eq!(radius_for(1e-6, 1.0, 1.0, 50.0), 1.0);
/// assert_eq!(radius_for(1e12, 1.0, 1.0, 50.0), 50.0);
/// ```
pub fn radius_for(mass: f64, density: f64, min_radius: f64, max_radius: f64) -> f64 {
    let area = mass / density.max(DENSITY_FLOOR);
    (area / PI).sqrt().clamp(min_radius, max_radius)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub id: ParticleId,
    pub position: Point2<f64>,
    /// Position at the start of the last tick, for render interpolation
    pub previous_position: Point2<f64>,
    pub velocity: Vector2<f64>,
    /// Acceleration from the last force evaluation
    pub acceleration: Vector2<f64>,
    pub mass: f64,
    pub density: f64,
    pub radius: f64,
    pub alive: bool,
    pub state: ParticleState,
    /// Frozen particles are not integrated but still attract and collide
    pub frozen: bool,
}

impl Particle {
    /// Creates a free, live particle with its radius derived from mass and density
    pub fn new(
        id: ParticleId,
        position: Point2<f64>,
        velocity: Vector2<f64>,
        mass: f64,
        density: f64,
        radius_range: (f64, f64),
    ) -> Self {
        Particle {
            id,
            position,
            previous_position: position,
            velocity,
            acceleration: Vector2::zeros(),
            mass,
            density,
            radius: radius_for(mass, density, radius_range.0, radius_range.1),
            alive: true,
            state: ParticleState::Free,
            frozen: false,
        }
    }

    /// Recomputes the radius after a change of mass or density
    pub fn refresh_radius(&mut self, min_radius: f64, max_radius: f64) {
        self.radius = radius_for(self.mass, self.density, min_radius, max_radius);
    }

    pub fn is_dragged(&self) -> bool {
        self.state == ParticleState::Dragged
    }

    pub fn in_menu(&self) -> bool {
        self.state == ParticleState::InMenu
    }

    /// Whether the particle is part of this tick's physics at all
    /// (gravity source, grid resident, hit-testable)
    pub fn is_physical(&self) -> bool {
        self.alive && !self.in_menu()
    }

    /// Whether the integrator advances this particle
    pub fn is_integrated(&self) -> bool {
        self.alive && self.state == ParticleState::Free && !self.frozen
    }

    /// Whether other particles may collide with this one
    pub fn is_collision_candidate(&self) -> bool {
        self.alive && self.state == ParticleState::Free
    }

    /// Velocity the particle actually moves with during a tick. Frozen,
    /// dragged and preview particles hold a stored velocity but do not move.
    pub fn motion(&self) -> Vector2<f64> {
        if self.is_integrated() {
            self.velocity
        } else {
            Vector2::zeros()
        }
    }

    pub fn area(&self) -> f64 {
        PI * self.radius * self.radius
    }

    pub fn momentum(&self) -> Vector2<f64> {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.magnitude_squared()
    }

    pub fn distance_to(&self, other: &Particle) -> f64 {
        (self.position - other.position).magnitude()
    }

    /// Point-in-circle test, boundary inclusive
    pub fn contains(&self, point: Point2<f64>) -> bool {
        (point - self.position).magnitude_squared() <= self.radius * self.radius
    }
}

impl crate::arena_quadtree::Massive for Particle {
    fn position(&self) -> Point2<f64> {
        self.position
    }

    fn mass(&self) -> f64 {
        self.mass
    }

    fn is_active(&self) -> bool {
        self.is_physical()
    }
}
