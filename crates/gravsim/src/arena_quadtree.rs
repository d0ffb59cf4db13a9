//! Arena-based Barnes-Hut quadtree.
//!
//! Nodes live in a fixed-size pool addressed by [`NodeId`] and are reset, not
//! reallocated, on every rebuild. Leaves hold up to `leaf_capacity` particle
//! indices; a full leaf splits into four tessellating quadrants (NW, NE, SW,
//! SE) until `max_depth`, where it keeps accepting particles instead. When the
//! pool runs out, leaves stop splitting the same way. Both cases degrade force
//! accuracy but never lose a particle.
//!
//! Every build ends with a post-order pass that aggregates mass and center of
//! mass, so queries always read a complete tree.
//!
//! # Example
//!
//! ```rust
//! use nalgebra::Point2;
//! use gravsim::arena_quadtree::{Massive, QuadTree};
//!
//! #[derive(Clone, Copy)]
//! struct Star {
//!     pos: Point2<f64>,
//!     mass: f64,
//! }
//!
//! impl Massive for Star {
//!     fn position(&self) -> Point2<f64> {
//!         self.pos
//!     }
//!
//!     fn mass(&self) -> f64 {
//!         self.mass
//!     }
//! }
//!
//! let stars = vec![
//!     Star { pos: Point2::new(0.0, 0.0), mass: 10.0 },
//!     Star { pos: Point2::new(100.0, 0.0), mass: 1.0 },
//! ];
//!
//! let mut tree = QuadTree::with_limits(6, 1, 128);
//! tree.build(&stars);
//!
//! assert_eq!(tree.root_mass(), 11.0);
//! let pseudo = tree.query_approx(Point2::new(100.0, 0.0), 0.75, 1e-5);
//! assert_eq!(pseudo.len(), 2);
//! ```

use nalgebra::{Point2, Vector2};

use crate::config::QuadTreeConfig;

/// Padding added around the tight bounding box of the particles so that no
/// particle sits exactly on the outer edge of the root
const ROOT_PADDING: f64 = 1e-5;

/// Minimal interface for anything the tree can index.
///
/// Inactive items are skipped by [`QuadTree::build`] and do not contribute
/// to the bounding box.
pub trait Massive {
    fn position(&self) -> Point2<f64>;

    fn mass(&self) -> f64;

    fn is_active(&self) -> bool {
        true
    }
}

/// Axis-aligned rectangle. `min` is the (left, top) corner, `max` the
/// (right, bottom) corner, with y growing downward as on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            min: Point2::new(left, top),
            max: Point2::new(left + width, top + height),
        }
    }

    /// Tight box around all active bodies, `None` if there are none
    pub fn new_from_bodies<B: Massive>(bodies: &[B]) -> Option<Self> {
        bodies
            .iter()
            .filter(|body| body.is_active())
            .map(|body| body.position())
            .fold(None, |bounds: Option<Self>, pos| {
                Some(match bounds {
                    None => Self { min: pos, max: pos },
                    Some(b) => Self {
                        min: Point2::new(b.min.x.min(pos.x), b.min.y.min(pos.y)),
                        max: Point2::new(b.max.x.max(pos.x), b.max.y.max(pos.y)),
                    },
                })
            })
    }

    /// Grows the box by `pad` on every side
    pub fn padded(&self, pad: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - pad, self.min.y - pad),
            max: Point2::new(self.max.x + pad, self.max.y + pad),
        }
    }

    pub fn left(&self) -> f64 {
        self.min.x
    }

    pub fn top(&self) -> f64 {
        self.min.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Half-open containment: left/top edges inclusive, right/bottom exclusive
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        self.min.x <= point.x && point.x < self.max.x && self.min.y <= point.y && point.y < self.max.y
    }

    fn center(&self) -> Point2<f64> {
        Point2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Quadrant (0-3) of a point relative to the center of this box.
    ///
    /// ```text
    /// +-------+-------+
    /// | 0 NW  | 1 NE  |   (top: smaller y)
    /// +-------+-------+
    /// | 2 SW  | 3 SE  |
    /// +-------+-------+
    /// ```
    ///
    /// Points outside the box fall into the nearest quadrant.
    fn quadrant(&self, point: &Point2<f64>) -> usize {
        let center = self.center();
        let x_bit = (point.x >= center.x) as usize;
        let y_bit = (point.y >= center.y) as usize;
        x_bit | (y_bit << 1)
    }

    /// Sub-box for the given quadrant
    fn subdivide(&self, quadrant: usize) -> Self {
        let center = self.center();
        let (min_x, max_x) = if quadrant & 1 != 0 {
            (center.x, self.max.x)
        } else {
            (self.min.x, center.x)
        };
        let (min_y, max_y) = if quadrant & 2 != 0 {
            (center.y, self.max.y)
        } else {
            (self.min.y, center.y)
        };
        BoundingBox {
            min: Point2::new(min_x, min_y),
            max: Point2::new(max_x, max_y),
        }
    }
}

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for an absent child
    pub const EMPTY: NodeId = NodeId(u32::MAX);

    pub const ROOT: NodeId = NodeId(0);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "NodeId overflow");
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

#[derive(Clone, Debug)]
struct Node {
    bounds: BoundingBox,
    /// [NW, NE, SW, SE], all `EMPTY` for a leaf
    children: [NodeId; 4],
    /// Indices into the body slice; always empty for internal nodes
    particles: Vec<u32>,
    mass: f64,
    center_of_mass: Point2<f64>,
    /// Cached `max(width, height)²` for the opening test
    max_side_sq: f64,
    depth: usize,
}

impl Node {
    fn new(bounds: BoundingBox, depth: usize) -> Self {
        let side = bounds.width().max(bounds.height());
        Node {
            bounds,
            children: [NodeId::EMPTY; 4],
            particles: Vec::new(),
            mass: 0.0,
            center_of_mass: Point2::origin(),
            max_side_sq: side * side,
            depth,
        }
    }

    /// Reinitialises a pooled node, keeping its particle buffer allocation
    fn reset(&mut self, bounds: BoundingBox, depth: usize) {
        let side = bounds.width().max(bounds.height());
        self.bounds = bounds;
        self.children = [NodeId::EMPTY; 4];
        self.particles.clear();
        self.mass = 0.0;
        self.center_of_mass = Point2::origin();
        self.max_side_sq = side * side;
        self.depth = depth;
    }

    fn is_leaf(&self) -> bool {
        self.children[0].is_empty()
    }
}

/// A point mass standing in for a whole node (or a single leaf)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PseudoParticle {
    pub position: Point2<f64>,
    pub mass: f64,
}

/// Read-only view of one node, for diagnostics and debug overlays
#[derive(Clone, Copy, Debug)]
pub struct NodeView<'a> {
    pub id: NodeId,
    pub bounds: BoundingBox,
    pub mass: f64,
    pub center_of_mass: Point2<f64>,
    pub depth: usize,
    pub is_leaf: bool,
    pub particles: &'a [u32],
}

/// Counters describing the last build
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes in use
    pub nodes: usize,
    /// Bodies inserted
    pub inserted: usize,
    /// Leaves holding more than `leaf_capacity` bodies
    pub overflowing_leaves: usize,
    /// Whether a split was refused because the pool was full
    pub pool_exhausted: bool,
}

/// Barnes-Hut quadtree over a pooled node arena.
///
/// The tree stores indices into the slice passed to [`QuadTree::build`]; it
/// holds no reference to it, so the same arena is reused tick after tick.
/// Indices are only meaningful against that slice until the next build.
#[derive(Clone, Debug)]
pub struct QuadTree {
    nodes: Vec<Node>,
    /// Number of nodes in use; `nodes[len..]` are pooled for reuse
    len: usize,
    max_depth: usize,
    leaf_capacity: usize,
    max_nodes: usize,
    stats: TreeStats,
}

impl QuadTree {
    pub fn new(config: &QuadTreeConfig) -> Self {
        Self::with_limits(config.max_depth, config.leaf_capacity, config.max_nodes)
    }

    /// Creates an empty tree with explicit limits.
    ///
    /// `leaf_capacity` and `max_nodes` are raised to at least 1.
    pub fn with_limits(max_depth: usize, leaf_capacity: usize, max_nodes: usize) -> Self {
        let max_nodes = max_nodes.max(1);
        QuadTree {
            nodes: Vec::with_capacity(max_nodes.min(1 << 16)),
            len: 0,
            max_depth,
            leaf_capacity: leaf_capacity.max(1),
            max_nodes,
            stats: TreeStats::default(),
        }
    }

    /// Rebuilds the tree over all active bodies.
    ///
    /// The root covers the tight bounding box of the active bodies, padded
    /// by a small epsilon. With no active body the tree is a single empty
    /// leaf of zero mass.
    pub fn build<B: Massive>(&mut self, bodies: &[B]) {
        let bounds = BoundingBox::new_from_bodies(bodies)
            .unwrap_or(BoundingBox {
                min: Point2::origin(),
                max: Point2::origin(),
            })
            .padded(ROOT_PADDING);
        self.build_within(bodies, bounds);
    }

    /// Rebuilds the tree with an explicit root region.
    ///
    /// Bodies outside `bounds` are still inserted, into the nearest quadrant.
    pub fn build_within<B: Massive>(&mut self, bodies: &[B], bounds: BoundingBox) {
        self.clear(bounds);

        for (index, body) in bodies.iter().enumerate() {
            if body.is_active() {
                self.insert(index, bodies);
                self.stats.inserted += 1;
            }
        }

        self.compute_mass_distribution(NodeId::ROOT, bodies);
        self.stats.nodes = self.len;

        if self.stats.pool_exhausted {
            log::warn!(
                "quadtree node pool exhausted ({} nodes); {} leaves over capacity",
                self.max_nodes,
                self.stats.overflowing_leaves
            );
        } else if self.stats.overflowing_leaves > 0 {
            log::debug!(
                "{} quadtree leaves over capacity at max depth {}",
                self.stats.overflowing_leaves,
                self.max_depth
            );
        }
    }

    /// Resets the pool and installs a fresh root
    fn clear(&mut self, bounds: BoundingBox) {
        self.len = 0;
        self.stats = TreeStats::default();
        let root = self.alloc(bounds, 0);
        debug_assert_eq!(root, Some(NodeId::ROOT));
    }

    /// Takes the next node from the pool, `None` when the pool is full
    fn alloc(&mut self, bounds: BoundingBox, depth: usize) -> Option<NodeId> {
        if self.len >= self.max_nodes {
            return None;
        }
        let id = NodeId::new(self.len);
        if self.len < self.nodes.len() {
            self.nodes[self.len].reset(bounds, depth);
        } else {
            self.nodes.push(Node::new(bounds, depth));
        }
        self.len += 1;
        Some(id)
    }

    /// Splits a leaf into four children. Returns `false`, leaving the node a
    /// leaf, when the pool cannot supply four more nodes.
    fn subdivide(&mut self, node_id: NodeId) -> bool {
        if self.len + 4 > self.max_nodes {
            self.stats.pool_exhausted = true;
            return false;
        }
        let node = &self.nodes[node_id.index()];
        let (bounds, depth) = (node.bounds, node.depth);

        let mut children = [NodeId::EMPTY; 4];
        for (quadrant, child) in children.iter_mut().enumerate() {
            // Capacity was checked above
            if let Some(id) = self.alloc(bounds.subdivide(quadrant), depth + 1) {
                *child = id;
            }
        }
        self.nodes[node_id.index()].children = children;
        true
    }

    fn insert<B: Massive>(&mut self, index: usize, bodies: &[B]) {
        let position = bodies[index].position();
        let mut node_id = NodeId::ROOT;

        loop {
            let node = &self.nodes[node_id.index()];

            if !node.is_leaf() {
                node_id = node.children[node.bounds.quadrant(&position)];
                continue;
            }

            if node.particles.len() < self.leaf_capacity || node.depth >= self.max_depth {
                self.nodes[node_id.index()].particles.push(index as u32);
                return;
            }

            if !self.subdivide(node_id) {
                self.nodes[node_id.index()].particles.push(index as u32);
                return;
            }

            // Push the residents down one level. Each child receives at most
            // `leaf_capacity` of them, so none of these pushes needs a split.
            let mut residents = std::mem::take(&mut self.nodes[node_id.index()].particles);
            let node = &self.nodes[node_id.index()];
            let (bounds, children) = (node.bounds, node.children);
            for &resident in &residents {
                let quadrant = bounds.quadrant(&bodies[resident as usize].position());
                self.nodes[children[quadrant].index()].particles.push(resident);
            }
            residents.clear();
            self.nodes[node_id.index()].particles = residents;
        }
    }

    /// Post-order aggregation of mass and center of mass
    fn compute_mass_distribution<B: Massive>(
        &mut self,
        node_id: NodeId,
        bodies: &[B],
    ) -> (f64, Vector2<f64>) {
        let (mass, weighted) = if self.nodes[node_id.index()].is_leaf() {
            let node = &self.nodes[node_id.index()];
            let overflowing = node.particles.len() > self.leaf_capacity;
            let sums = node
                .particles
                .iter()
                .fold((0.0f64, Vector2::zeros()), |(mass, pos), &i| {
                    let body = &bodies[i as usize];
                    let m = body.mass();
                    (mass + m, pos + body.position().coords * m)
                });
            if overflowing {
                self.stats.overflowing_leaves += 1;
            }
            sums
        } else {
            let children = self.nodes[node_id.index()].children;
            children
                .iter()
                .fold((0.0f64, Vector2::zeros()), |(mass, pos), &child| {
                    let (child_mass, child_weighted) =
                        self.compute_mass_distribution(child, bodies);
                    (mass + child_mass, pos + child_weighted)
                })
        };

        let node = &mut self.nodes[node_id.index()];
        node.mass = mass;
        node.center_of_mass = if mass > 0.0 {
            Point2::from(weighted / mass)
        } else {
            Point2::origin()
        };
        (mass, weighted)
    }

    /// Collects the pseudo-particles a body at `pos` must sum forces over.
    ///
    /// A node is emitted as one point mass at its center of mass when it is
    /// a leaf or when `s² < θ² · d²`, with `s` the longest side of the node
    /// and `d² = |com - pos|² + softening`. Otherwise its non-empty children
    /// are visited. Empty nodes are never emitted.
    ///
    /// The querying body is not excluded from its own leaf; softening keeps
    /// the resulting self-term finite.
    pub fn query_approx(&self, pos: Point2<f64>, theta: f64, softening: f64) -> Vec<PseudoParticle> {
        let mut out = Vec::new();
        self.query_approx_into(pos, theta, softening, &mut out);
        out
    }

    /// Like [`QuadTree::query_approx`], appending into a caller-owned buffer
    /// after clearing it
    pub fn query_approx_into(
        &self,
        pos: Point2<f64>,
        theta: f64,
        softening: f64,
        out: &mut Vec<PseudoParticle>,
    ) {
        out.clear();
        if self.len == 0 {
            return;
        }
        self.query_recursive(NodeId::ROOT, pos, theta * theta, softening, out);
    }

    fn query_recursive(
        &self,
        node_id: NodeId,
        pos: Point2<f64>,
        theta_sq: f64,
        softening: f64,
        out: &mut Vec<PseudoParticle>,
    ) {
        let node = &self.nodes[node_id.index()];
        if node.mass <= 0.0 {
            return;
        }

        let d_sq = (node.center_of_mass - pos).magnitude_squared() + softening;

        if node.is_leaf() || node.max_side_sq < theta_sq * d_sq {
            out.push(PseudoParticle {
                position: node.center_of_mass,
                mass: node.mass,
            });
        } else {
            for &child in &node.children {
                self.query_recursive(child, pos, theta_sq, softening, out);
            }
        }
    }

    /// Nodes in use
    pub fn node_count(&self) -> usize {
        self.len
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn root_mass(&self) -> f64 {
        self.nodes.first().filter(|_| self.len > 0).map_or(0.0, |n| n.mass)
    }

    pub fn root_center_of_mass(&self) -> Point2<f64> {
        self.nodes
            .first()
            .filter(|_| self.len > 0)
            .map_or(Point2::origin(), |n| n.center_of_mass)
    }

    pub fn root_bounds(&self) -> Option<BoundingBox> {
        self.nodes.first().filter(|_| self.len > 0).map(|n| n.bounds)
    }

    /// Nodes in use, in allocation order (root first)
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'_>> + '_ {
        self.nodes[..self.len]
            .iter()
            .enumerate()
            .map(|(index, node)| NodeView {
                id: NodeId::new(index),
                bounds: node.bounds,
                mass: node.mass,
                center_of_mass: node.center_of_mass,
                depth: node.depth,
                is_leaf: node.is_leaf(),
                particles: &node.particles,
            })
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn leaf_capacity(&self) -> usize {
        self.leaf_capacity
    }
}
