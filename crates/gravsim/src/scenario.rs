//! Initial conditions: random fills and rotating disks.
//!
//! Every function takes the random source as an argument, so a seeded
//! `ChaChaRng` reproduces the same scene exactly.

use nalgebra::{Point2, Vector2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::particle::ParticleId;
use crate::simulation::Simulation;

/// Value ranges for randomly generated particles
///
/// Velocity components are drawn from `[0, max_speed]`, mass and density
/// from `[1, max]`, all as whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub max_speed: u32,
    pub max_mass: u32,
    pub max_density: u32,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            max_speed: 20,
            max_mass: 100,
            max_density: 10,
        }
    }
}

/// A disk of particles orbiting a heavy central particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskParams {
    pub central_mass: f64,
    pub central_density: f64,
    pub count: usize,
    pub inner_radius: f64,
    pub outer_radius: f64,
}

impl Default for DiskParams {
    fn default() -> Self {
        Self {
            central_mass: 100_000.0,
            central_density: 100.0,
            count: 500,
            inner_radius: 100.0,
            outer_radius: 800.0,
        }
    }
}

/// Velocity of a circular orbit at `position` around the origin
///
/// Points perpendicular to the radius (counter-clockwise with y up) with
/// speed `sqrt(G·M/r)`. Zero at the origin.
///
/// # Examples
///
/// ```
/// use gravsim::scenario::circular_velocity;
/// use nalgebra::Point2;
///
/// let v = circular_velocity(Point2::new(4.0, 0.0), 16.0, 1.0);
/// assert!((v.y - 2.0).abs() < 1e-12);
/// assert!(v.x.abs() < 1e-12);
/// ```
pub fn circular_velocity(
    position: Point2<f64>,
    enclosed_mass: f64,
    gravitational_constant: f64,
) -> Vector2<f64> {
    let r = position.coords.magnitude();
    if r == 0.0 {
        return Vector2::zeros();
    }
    let speed = (gravitational_constant * enclosed_mass / r).sqrt();
    Vector2::new(-position.y, position.x) / r * speed
}

/// Spawns `count` particles uniformly over the world
///
/// Stops at the first spawn error (typically the particle limit); particles
/// created before it stay in the simulation.
pub fn populate_uniform<R: Rng>(
    sim: &mut Simulation,
    count: usize,
    params: &ScenarioParams,
    rng: &mut R,
) -> Result<Vec<ParticleId>> {
    let half_extent = sim.config().world_half_extent;
    let mut ids = Vec::with_capacity(count);

    for _ in 0..count {
        let x = rng.gen_range(-half_extent..=half_extent);
        let y = rng.gen_range(-half_extent..=half_extent);
        let vx = rng.gen_range(0..=params.max_speed) as f64;
        let vy = rng.gen_range(0..=params.max_speed) as f64;
        let mass = rng.gen_range(1..=params.max_mass.max(1)) as f64;
        let density = rng.gen_range(1..=params.max_density.max(1)) as f64;
        ids.push(sim.spawn_particle(x, y, vx, vy, mass, density)?);
    }

    log::info!("populated {} random particles", ids.len());
    Ok(ids)
}

/// Spawns a central particle at the origin and a disk of particles in
/// circular orbit around it
///
/// Radii are area-uniform in `[inner_radius, outer_radius]`. Each orbit uses
/// the central mass plus the disk mass inside that radius. Returns the
/// central particle's id first.
pub fn populate_disk<R: Rng>(
    sim: &mut Simulation,
    disk: &DiskParams,
    params: &ScenarioParams,
    rng: &mut R,
) -> Result<Vec<ParticleId>> {
    let config = sim.config();
    let limit = config.world_half_extent - config.max_radius;
    if !(0.0 <= disk.inner_radius && disk.inner_radius < disk.outer_radius && disk.outer_radius < limit)
    {
        return Err(SimError::InvalidConfig(format!(
            "disk radii [{}, {}] must be ordered and inside the world (< {limit})",
            disk.inner_radius, disk.outer_radius
        )));
    }
    let g = config.gravitational_constant;

    let inner_sq = disk.inner_radius * disk.inner_radius;
    let outer_sq = disk.outer_radius * disk.outer_radius;
    let mut orbits: Vec<(f64, f64, f64, f64)> = (0..disk.count)
        .map(|_| {
            let r = rng.gen_range(inner_sq..=outer_sq).sqrt();
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let mass = rng.gen_range(1..=params.max_mass.max(1)) as f64;
            let density = rng.gen_range(1..=params.max_density.max(1)) as f64;
            (r, angle, mass, density)
        })
        .collect();
    orbits.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ids = Vec::with_capacity(disk.count + 1);
    ids.push(sim.spawn_particle(0.0, 0.0, 0.0, 0.0, disk.central_mass, disk.central_density)?);

    let mut enclosed = disk.central_mass;
    for (r, angle, mass, density) in orbits {
        let position = Point2::new(r * angle.cos(), r * angle.sin());
        let velocity = circular_velocity(position, enclosed, g);
        ids.push(sim.spawn_particle(position.x, position.y, velocity.x, velocity.y, mass, density)?);
        enclosed += mass;
    }

    log::info!(
        "populated disk of {} particles around central mass {}",
        disk.count,
        disk.central_mass
    );
    Ok(ids)
}

/// Tops the simulation up to `target` particles with random ones and returns
/// how many were created
pub fn repopulate<R: Rng>(
    sim: &mut Simulation,
    target: usize,
    params: &ScenarioParams,
    rng: &mut R,
) -> Result<usize> {
    let present = sim.particle_count();
    if present >= target {
        log::info!("already {present} particles, nothing to repopulate");
        return Ok(0);
    }
    populate_uniform(sim, target - present, params, rng).map(|ids| ids.len())
}
