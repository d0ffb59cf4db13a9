//! Barnes-Hut gravity over a prebuilt quadtree (O(N log N))

use nalgebra::{Point2, Vector2};

use crate::arena_quadtree::{PseudoParticle, QuadTree};
use crate::forces::{gravity_accel, ForceModel};
use crate::particle::Particle;

/// Gravity summed over the pseudo-particles of a Barnes-Hut query
///
/// Borrows a tree that must already be built over the same particles the
/// caller integrates; the `particles` argument of [`ForceModel::acceleration`]
/// is not consulted.
///
/// # Opening parameter (θ)
///
/// - θ = 0.0: every leaf is visited (exact when leaves hold one particle)
/// - θ = 0.5: accurate
/// - θ = 0.75: default, good for interactive rates
/// - θ ≥ 1.0: fast, coarse
///
/// # Examples
///
/// ```
/// use gravsim::arena_quadtree::QuadTree;
/// use gravsim::forces::{ForceModel, TreeGravity};
/// use gravsim::particle::{Particle, ParticleId};
/// use nalgebra::{Point2, Vector2};
///
/// let particles = vec![
///     Particle::new(ParticleId(0), Point2::new(0.0, 0.0), Vector2::zeros(), 100.0, 1.0, (1.0, 50.0)),
///     Particle::new(ParticleId(1), Point2::new(10.0, 0.0), Vector2::zeros(), 1.0, 1.0, (1.0, 50.0)),
/// ];
///
/// let mut tree = QuadTree::with_limits(6, 1, 64);
/// tree.build(&particles);
///
/// let gravity = TreeGravity::new(&tree, 0.75, 1.0, 1e-5);
/// let accel = gravity.acceleration(particles[1].position, &particles);
/// assert!(accel.x < 0.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TreeGravity<'t> {
    tree: &'t QuadTree,
    pub theta: f64,
    pub gravitational_constant: f64,
    pub softening: f64,
}

impl<'t> TreeGravity<'t> {
    pub fn new(tree: &'t QuadTree, theta: f64, gravitational_constant: f64, softening: f64) -> Self {
        Self {
            tree,
            theta,
            gravitational_constant,
            softening,
        }
    }

    /// Acceleration at `position`, reusing `scratch` for the pseudo-particle list
    pub fn acceleration_with(
        &self,
        position: Point2<f64>,
        scratch: &mut Vec<PseudoParticle>,
    ) -> Vector2<f64> {
        self.tree
            .query_approx_into(position, self.theta, self.softening, scratch);
        scratch
            .iter()
            .map(|pseudo| {
                gravity_accel(
                    position,
                    pseudo.position,
                    pseudo.mass,
                    self.gravitational_constant,
                    self.softening,
                )
            })
            .fold(Vector2::zeros(), |acc, a| acc + a)
    }
}

impl ForceModel for TreeGravity<'_> {
    fn acceleration(&self, position: Point2<f64>, _particles: &[Particle]) -> Vector2<f64> {
        let mut scratch = Vec::new();
        self.acceleration_with(position, &mut scratch)
    }
}
