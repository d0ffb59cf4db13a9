//! Simulation configuration.
//!
//! [`SimulationConfig`] collects every tunable of the engine: the gravitational
//! constant, the Barnes-Hut opening parameter, quadtree limits, world size,
//! radius and density ranges, the fixed timestep and the collision policy.
//! All structs are `serde`-deserializable with defaults on every field, so a
//! YAML file only needs to mention the values it changes:
//!
//! ```yaml
//! gravitational_constant: 2.5
//! theta: 0.5
//! quadtree:
//!   leaf_capacity: 16
//! collision_mode: bounce
//! drag_release:
//!   fixed_speed: 150.0
//! ```
//!
//! `drag_release: {fixed_speed: ..}` is the single-key map form of an enum
//! variant; with `serde_yaml` read such files through
//! `serde_yaml::with::singleton_map_recursive`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// How gravitational accelerations are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GravityMode {
    /// Quadtree approximation controlled by `theta` (O(N log N))
    BarnesHut,
    /// Exact all-pairs sum (O(N²)), for validation and small sets
    Direct,
}

/// What happens when two particles touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionMode {
    /// Inelastic: the pair becomes one particle
    Merge,
    /// Elastic: the pair bounces along the contact normal
    Bounce,
}

/// Velocity given to a particle when the user lets go of it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragRelease {
    /// Keep the cursor velocity recorded during the drag
    CursorVelocity,
    /// Keep the cursor direction but rescale to this speed
    FixedSpeed(f64),
}

/// Limits of the Barnes-Hut node arena
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadTreeConfig {
    /// Depth at which leaves stop subdividing and accept overflow
    pub max_depth: usize,
    /// Particles a leaf holds before it subdivides
    pub leaf_capacity: usize,
    /// Size of the node pool
    pub max_nodes: usize,
}

impl QuadTreeConfig {
    /// Number of nodes in a complete quadtree of the given depth
    pub fn full_tree_nodes(max_depth: usize) -> usize {
        (4usize.pow(max_depth as u32 + 1) - 1) / 3
    }
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            leaf_capacity: 64,
            max_nodes: Self::full_tree_nodes(6),
        }
    }
}

/// All tunables of a simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Gravitational constant G in world units
    pub gravitational_constant: f64,
    /// Barnes-Hut opening parameter θ (smaller = more accurate, slower)
    pub theta: f64,
    /// Softening ε added to squared distances
    pub softening: f64,
    pub gravity: GravityMode,
    pub quadtree: QuadTreeConfig,
    /// The world is the square [-h, h] × [-h, h]
    pub world_half_extent: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub min_density: f64,
    pub max_density: f64,
    /// Grid cell edge length; defaults to the largest particle diameter
    pub grid_cell_size: Option<f64>,
    /// Fixed physics timestep
    pub timestep: f64,
    /// Ticks run at most per rendered frame
    pub max_catch_up_ticks: usize,
    pub collision_mode: CollisionMode,
    pub drag_release: DragRelease,
    pub max_particles: usize,
    /// Accumulate forces on the rayon thread pool
    pub parallel: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: 1.0,
            theta: 0.75,
            softening: 1e-5,
            gravity: GravityMode::BarnesHut,
            quadtree: QuadTreeConfig::default(),
            world_half_extent: 1000.0,
            min_radius: 1.0,
            max_radius: 50.0,
            min_density: 0.1,
            max_density: 100.0,
            grid_cell_size: None,
            timestep: 0.01,
            max_catch_up_ticks: 5,
            collision_mode: CollisionMode::Merge,
            drag_release: DragRelease::CursorVelocity,
            max_particles: 10_000,
            parallel: false,
        }
    }
}

impl SimulationConfig {
    /// Effective grid cell size
    pub fn cell_size(&self) -> f64 {
        self.grid_cell_size.unwrap_or(2.0 * self.max_radius)
    }

    /// Checks every field for a usable value
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::config::SimulationConfig;
    ///
    /// assert!(SimulationConfig::default().validate().is_ok());
    ///
    /// let bad = SimulationConfig { timestep: 0.0, ..Default::default() };
    /// assert!(bad.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        }

        positive("gravitational_constant", self.gravitational_constant)?;
        positive("softening", self.softening)?;
        positive("world_half_extent", self.world_half_extent)?;
        positive("min_radius", self.min_radius)?;
        positive("max_radius", self.max_radius)?;
        positive("min_density", self.min_density)?;
        positive("max_density", self.max_density)?;
        positive("timestep", self.timestep)?;
        positive("grid_cell_size", self.cell_size())?;

        if !(self.theta.is_finite() && self.theta >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "theta must be non-negative, got {}",
                self.theta
            )));
        }
        if self.min_radius > self.max_radius {
            return Err(SimError::InvalidConfig(format!(
                "min_radius {} exceeds max_radius {}",
                self.min_radius, self.max_radius
            )));
        }
        if self.min_density > self.max_density {
            return Err(SimError::InvalidConfig(format!(
                "min_density {} exceeds max_density {}",
                self.min_density, self.max_density
            )));
        }
        if self.cell_size() < 2.0 * self.max_radius {
            return Err(SimError::InvalidConfig(format!(
                "grid_cell_size {} is smaller than the largest diameter {}",
                self.cell_size(),
                2.0 * self.max_radius
            )));
        }
        if self.quadtree.leaf_capacity == 0
            || self.quadtree.max_depth == 0
            || self.quadtree.max_nodes == 0
        {
            return Err(SimError::InvalidConfig(
                "quadtree depth, capacity and node pool must be non-zero".to_string(),
            ));
        }
        if self.max_catch_up_ticks == 0 {
            return Err(SimError::InvalidConfig(
                "max_catch_up_ticks must be at least 1".to_string(),
            ));
        }
        if let DragRelease::FixedSpeed(speed) = self.drag_release {
            if !(speed.is_finite() && speed >= 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "drag release speed must be non-negative, got {speed}"
                )));
            }
        }

        Ok(())
    }
}
