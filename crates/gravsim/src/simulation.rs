//! The simulation: live particle set, spatial indices and the fixed-step clock.
//!
//! [`Simulation`] owns every particle together with the spatial grid and the
//! quadtree. Both indices hold plain indices into the particle vector and are
//! rebuilt on every tick, so nothing aliases particles across ticks.
//!
//! One tick runs as phases over the whole set:
//!
//! 1. drift and wall reflection of every integrated particle
//! 2. grid and quadtree rebuild from the drifted positions
//! 3. new accelerations from the frozen tree (optionally on the rayon pool)
//! 4. serialized collision pass over grid neighbors (merge or bounce)
//! 5. kick with the average of old and new accelerations
//! 6. removal of absorbed particles
//!
//! Each particle therefore still sees drift, force, collision, kick in order.

use std::collections::HashMap;

use nalgebra::{Point2, Vector2};
use rayon::prelude::*;

use crate::arena_quadtree::{PseudoParticle, QuadTree, TreeStats};
use crate::collisions::{bounce_particles, ccd, merge_particles, MaterialLimits};
use crate::config::{CollisionMode, DragRelease, GravityMode, SimulationConfig};
use crate::error::{Result, SimError};
use crate::forces::{DirectGravity, ForceModel, TreeGravity};
use crate::integrator::{drift, kick};
use crate::particle::{Particle, ParticleId, ParticleState};
use crate::spatial_grid::SpatialGrid;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Pairs merged into one particle
    pub merges: usize,
    /// Pairs that bounced
    pub bounces: usize,
    /// Particles reflected off a wall
    pub wall_hits: usize,
    /// Particles removed by merging
    pub removed: Vec<ParticleId>,
}

impl StepReport {
    fn absorb(&mut self, other: StepReport) {
        self.merges += other.merges;
        self.bounces += other.bounces;
        self.wall_hits += other.wall_hits;
        self.removed.extend(other.removed);
    }
}

/// What happened during one rendered frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Physics ticks run this frame
    pub ticks: usize,
    /// Combined report of those ticks
    pub steps: StepReport,
    /// Backlog discarded because the catch-up limit was hit
    pub dropped_time: f64,
}

/// Complete state of a running simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    particles: Vec<Particle>,
    /// Position of every particle in `particles`, by id
    slots: HashMap<ParticleId, usize>,
    tree: QuadTree,
    grid: SpatialGrid,
    /// Next available particle id
    next_id: u32,
    /// Simulated time
    time: f64,
    ticks: u64,
    /// Unsimulated frame time carried to the next frame
    accumulator: f64,
    new_accelerations: Vec<Vector2<f64>>,
    neighbor_scratch: Vec<usize>,
    pseudo_scratch: Vec<PseudoParticle>,
}

impl Simulation {
    /// Creates an empty simulation
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::config::SimulationConfig;
    /// use gravsim::simulation::Simulation;
    ///
    /// let sim = Simulation::new(SimulationConfig::default()).unwrap();
    /// assert_eq!(sim.particle_count(), 0);
    /// assert_eq!(sim.time(), 0.0);
    ///
    /// let bad = SimulationConfig { theta: -1.0, ..Default::default() };
    /// assert!(Simulation::new(bad).is_err());
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tree: QuadTree::new(&config.quadtree),
            grid: SpatialGrid::new(config.cell_size()),
            config,
            particles: Vec::new(),
            slots: HashMap::new(),
            next_id: 0,
            time: 0.0,
            ticks: 0,
            accumulator: 0.0,
            new_accelerations: Vec::new(),
            neighbor_scratch: Vec::new(),
            pseudo_scratch: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Adds a free particle and returns its id
    ///
    /// Fails without inserting anything when mass or density is not positive
    /// and finite, when a coordinate is not finite, or when the particle limit
    /// is reached.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::config::SimulationConfig;
    /// use gravsim::error::SimError;
    /// use gravsim::simulation::Simulation;
    ///
    /// let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
    /// let id = sim.spawn_particle(10.0, -5.0, 0.0, 1.0, 50.0, 2.0).unwrap();
    /// assert_eq!(sim.mass(id), Some(50.0));
    ///
    /// let err = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, -1.0, 1.0).unwrap_err();
    /// assert!(matches!(err, SimError::InvalidParticle { field: "mass", .. }));
    /// assert_eq!(sim.particle_count(), 1);
    /// ```
    pub fn spawn_particle(
        &mut self,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        mass: f64,
        density: f64,
    ) -> Result<ParticleId> {
        self.insert_particle(x, y, vx, vy, mass, density, ParticleState::Free)
    }

    /// Adds a physics-inert preview particle, as shown by a creation menu
    /// while its values are being edited
    pub fn spawn_preview(
        &mut self,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        mass: f64,
        density: f64,
    ) -> Result<ParticleId> {
        self.insert_particle(x, y, vx, vy, mass, density, ParticleState::InMenu)
    }

    /// Replaces the values of a preview particle
    #[allow(clippy::too_many_arguments)]
    pub fn update_preview(
        &mut self,
        id: ParticleId,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        mass: f64,
        density: f64,
    ) -> Result<()> {
        validate_particle(x, y, vx, vy, mass, density)?;
        let (min_radius, max_radius) = (self.config.min_radius, self.config.max_radius);
        let particle = self.live_mut(id)?;
        if !particle.in_menu() {
            return Err(SimError::UnknownParticle(id));
        }
        particle.position = Point2::new(x, y);
        particle.previous_position = particle.position;
        particle.velocity = Vector2::new(vx, vy);
        particle.mass = mass;
        particle.density = density;
        particle.refresh_radius(min_radius, max_radius);
        Ok(())
    }

    /// Releases a preview particle into the simulation
    pub fn commit_preview(&mut self, id: ParticleId) -> Result<()> {
        let particle = self.live_mut(id)?;
        if particle.in_menu() {
            particle.state = ParticleState::Free;
            log::info!(
                "created particle {} at ({:.1}, {:.1})",
                id,
                particle.position.x,
                particle.position.y
            );
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_particle(
        &mut self,
        x: f64,
        y: f64,
        vx: f64,
        vy: f64,
        mass: f64,
        density: f64,
        state: ParticleState,
    ) -> Result<ParticleId> {
        validate_particle(x, y, vx, vy, mass, density)?;
        if self.particles.len() >= self.config.max_particles {
            return Err(SimError::ParticleLimit {
                limit: self.config.max_particles,
            });
        }

        let id = ParticleId(self.next_id);
        self.next_id += 1;

        let mut particle = Particle::new(
            id,
            Point2::new(x, y),
            Vector2::new(vx, vy),
            mass,
            density,
            (self.config.min_radius, self.config.max_radius),
        );
        particle.state = state;
        self.slots.insert(id, self.particles.len());
        self.particles.push(particle);

        log::debug!("spawned particle {id} (mass {mass}, density {density})");
        Ok(id)
    }

    /// Removes a particle. Returns `false` if no live particle has this id.
    pub fn kill_particle(&mut self, id: ParticleId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.particles.remove(index);
                self.reindex();
                log::debug!("killed particle {id}");
                true
            }
            None => false,
        }
    }

    /// First physical particle, in insertion order, whose disk contains `point`
    pub fn query_particle_at(&self, point: Point2<f64>) -> Option<ParticleId> {
        self.particles
            .iter()
            .find(|p| p.is_physical() && p.contains(point))
            .map(|p| p.id)
    }

    /// Advances all particles by one tick of length `dt`
    ///
    /// Never fails; a non-positive or non-finite `dt` is ignored.
    pub fn step_simulation(&mut self, dt: f64) -> StepReport {
        let mut report = StepReport::default();
        if !(dt.is_finite() && dt > 0.0) {
            log::debug!("ignoring step with dt = {dt}");
            return report;
        }

        let half_extent = self.config.world_half_extent;
        for particle in &mut self.particles {
            if particle.is_integrated() {
                if drift(particle, dt, half_extent).any() {
                    report.wall_hits += 1;
                }
            } else {
                particle.previous_position = particle.position;
            }
        }

        self.rebuild_indices();
        self.compute_accelerations();
        self.resolve_collisions(dt, &mut report);

        for (particle, &acceleration) in self.particles.iter_mut().zip(&self.new_accelerations) {
            if particle.is_integrated() {
                kick(particle, acceleration, dt);
            }
        }

        report.removed = self
            .particles
            .iter()
            .filter(|p| !p.alive)
            .map(|p| p.id)
            .collect();
        if !report.removed.is_empty() {
            self.particles.retain(|p| p.alive);
            self.reindex();
        }

        self.time += dt;
        self.ticks += 1;
        report
    }

    /// Runs as many fixed ticks as the elapsed frame time allows
    ///
    /// Frame time accumulates across calls; at most `max_catch_up_ticks` run
    /// per call and any backlog beyond that is dropped, bounding the cost of
    /// a slow frame.
    ///
    /// # Examples
    ///
    /// ```
    /// use gravsim::config::SimulationConfig;
    /// use gravsim::simulation::Simulation;
    ///
    /// let config = SimulationConfig { timestep: 0.01, max_catch_up_ticks: 3, ..Default::default() };
    /// let mut sim = Simulation::new(config).unwrap();
    ///
    /// assert_eq!(sim.advance(0.025).ticks, 2);
    /// assert_eq!(sim.advance(1.0).ticks, 3);
    /// ```
    pub fn advance(&mut self, frame_dt: f64) -> FrameReport {
        let mut frame = FrameReport::default();
        if !(frame_dt.is_finite() && frame_dt > 0.0) {
            return frame;
        }

        let dt = self.config.timestep;
        self.accumulator += frame_dt;

        while self.accumulator >= dt && frame.ticks < self.config.max_catch_up_ticks {
            let report = self.step_simulation(dt);
            frame.steps.absorb(report);
            self.accumulator -= dt;
            frame.ticks += 1;
        }

        if self.accumulator >= dt {
            let kept = self.accumulator % dt;
            frame.dropped_time = self.accumulator - kept;
            self.accumulator = kept;
            log::debug!(
                "physics fell behind; dropped {:.4} of simulated time",
                frame.dropped_time
            );
        }

        frame
    }

    /// Fraction of a tick carried in the accumulator, in `[0, 1)`
    pub fn interpolation_alpha(&self) -> f64 {
        (self.accumulator / self.config.timestep).clamp(0.0, 1.0)
    }

    /// Position to draw a particle at, interpolated between its last two
    /// tick positions by [`Simulation::interpolation_alpha`]
    pub fn render_position(&self, id: ParticleId) -> Option<Point2<f64>> {
        let alpha = self.interpolation_alpha();
        self.particle(id).map(|p| {
            p.previous_position + (p.position - p.previous_position) * alpha
        })
    }

    /// Puts a particle under direct manipulation
    pub fn begin_drag(&mut self, id: ParticleId) -> Result<()> {
        let particle = self.live_mut(id)?;
        if particle.in_menu() {
            return Err(SimError::UnknownParticle(id));
        }
        particle.state = ParticleState::Dragged;
        Ok(())
    }

    /// Moves a dragged particle to `position`; its velocity becomes the
    /// cursor velocity over `frame_dt`
    pub fn drag_to(&mut self, id: ParticleId, position: Point2<f64>, frame_dt: f64) -> Result<()> {
        if !(position.x.is_finite() && position.y.is_finite()) {
            return Err(SimError::InvalidParticle {
                field: "position",
                value: if position.x.is_finite() { position.y } else { position.x },
            });
        }
        let particle = self.live_mut(id)?;
        if !particle.is_dragged() {
            return Err(SimError::UnknownParticle(id));
        }
        if frame_dt > 0.0 {
            particle.velocity = (position - particle.position) / frame_dt;
        }
        particle.previous_position = particle.position;
        particle.position = position;
        Ok(())
    }

    /// Releases a dragged particle, applying the configured release policy
    pub fn end_drag(&mut self, id: ParticleId) -> Result<()> {
        let release = self.config.drag_release;
        let particle = self.live_mut(id)?;
        if !particle.is_dragged() {
            return Ok(());
        }
        particle.state = ParticleState::Free;
        particle.acceleration = Vector2::zeros();
        if let DragRelease::FixedSpeed(speed) = release {
            if let Some(direction) = particle.velocity.try_normalize(f64::EPSILON) {
                particle.velocity = direction * speed;
            }
        }
        Ok(())
    }

    /// Freezes or thaws a particle. Frozen particles are not integrated but
    /// still attract others and can be hit.
    pub fn set_frozen(&mut self, id: ParticleId, frozen: bool) -> Result<()> {
        self.live_mut(id)?.frozen = frozen;
        Ok(())
    }

    fn rebuild_indices(&mut self) {
        self.grid.clear();
        for (index, particle) in self.particles.iter().enumerate() {
            if particle.is_physical() {
                self.grid.insert(index, particle.position);
            }
        }

        if self.config.gravity == GravityMode::BarnesHut {
            self.tree.build(&self.particles);
        }
    }

    /// Fills `new_accelerations` with one entry per particle, zero for
    /// particles that are not integrated
    fn compute_accelerations(&mut self) {
        let config = &self.config;
        let particles = &self.particles;
        let out = &mut self.new_accelerations;

        match config.gravity {
            GravityMode::BarnesHut => {
                let gravity = TreeGravity::new(
                    &self.tree,
                    config.theta,
                    config.gravitational_constant,
                    config.softening,
                );
                if config.parallel {
                    particles
                        .par_iter()
                        .map_init(Vec::new, |scratch, p| {
                            if p.is_integrated() {
                                gravity.acceleration_with(p.position, scratch)
                            } else {
                                Vector2::zeros()
                            }
                        })
                        .collect_into_vec(out);
                } else {
                    let scratch = &mut self.pseudo_scratch;
                    out.clear();
                    out.extend(particles.iter().map(|p| {
                        if p.is_integrated() {
                            gravity.acceleration_with(p.position, scratch)
                        } else {
                            Vector2::zeros()
                        }
                    }));
                }
            }
            GravityMode::Direct => {
                let gravity = DirectGravity::new(config.gravitational_constant, config.softening);
                let accelerate = |p: &Particle| {
                    if p.is_integrated() {
                        gravity.acceleration(p.position, particles)
                    } else {
                        Vector2::zeros()
                    }
                };
                if config.parallel {
                    particles.par_iter().map(accelerate).collect_into_vec(out);
                } else {
                    out.clear();
                    out.extend(particles.iter().map(accelerate));
                }
            }
        }
    }

    /// Serialized narrow phase over grid neighbors
    fn resolve_collisions(&mut self, dt: f64, report: &mut StepReport) {
        let limits = MaterialLimits::from(&self.config);
        let mode = self.config.collision_mode;
        let mut neighbors = std::mem::take(&mut self.neighbor_scratch);

        for i in 0..self.particles.len() {
            if !self.particles[i].is_integrated() {
                continue;
            }
            self.grid
                .neighbors_into(self.particles[i].position, &mut neighbors);

            for &j in &neighbors {
                if j == i {
                    continue;
                }
                // Integrated particles with a lower index already bounced
                // against this one as the subject
                if mode == CollisionMode::Bounce && j < i && self.particles[j].is_integrated() {
                    continue;
                }

                let (a, b) = pair_mut(&mut self.particles, i, j);
                if !b.is_collision_candidate() {
                    continue;
                }
                let Some(t) = ccd(a, b, dt) else {
                    continue;
                };

                match mode {
                    CollisionMode::Merge => {
                        let a_survived = merge_particles(a, b, &limits);
                        report.merges += 1;
                        let (survivor, absorbed) = if a_survived { (&*a, &*b) } else { (&*b, &*a) };
                        log::debug!(
                            "particle {} absorbed {} (mass now {})",
                            survivor.id,
                            absorbed.id,
                            survivor.mass
                        );
                        if !a_survived {
                            break;
                        }
                    }
                    CollisionMode::Bounce => {
                        if bounce_particles(a, b, t) {
                            report.bounces += 1;
                        }
                    }
                }
            }
        }

        self.neighbor_scratch = neighbors;
    }

    fn reindex(&mut self) {
        self.slots.clear();
        self.slots
            .extend(self.particles.iter().enumerate().map(|(index, p)| (p.id, index)));
    }

    fn index_of(&self, id: ParticleId) -> Option<usize> {
        self.slots
            .get(&id)
            .copied()
            .filter(|&index| self.particles[index].alive)
    }

    fn live_mut(&mut self, id: ParticleId) -> Result<&mut Particle> {
        let index = self.index_of(id).ok_or(SimError::UnknownParticle(id))?;
        Ok(&mut self.particles[index])
    }

    /// Live particle by id
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.index_of(id).map(|index| &self.particles[index])
    }

    pub fn position(&self, id: ParticleId) -> Option<Point2<f64>> {
        self.particle(id).map(|p| p.position)
    }

    pub fn velocity(&self, id: ParticleId) -> Option<Vector2<f64>> {
        self.particle(id).map(|p| p.velocity)
    }

    pub fn mass(&self, id: ParticleId) -> Option<f64> {
        self.particle(id).map(|p| p.mass)
    }

    pub fn density(&self, id: ParticleId) -> Option<f64> {
        self.particle(id).map(|p| p.density)
    }

    pub fn radius(&self, id: ParticleId) -> Option<f64> {
        self.particle(id).map(|p| p.radius)
    }

    pub fn is_alive(&self, id: ParticleId) -> bool {
        self.particle(id).is_some()
    }

    /// All live particles in insertion order, previews included
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.iter().filter(|p| p.alive)
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Simulated time
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Quadtree from the last tick, for debug overlays
    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    pub fn tree_stats(&self) -> TreeStats {
        self.tree.stats()
    }

    /// Spatial grid from the last tick
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Total mass of the physical particles
    pub fn total_mass(&self) -> f64 {
        self.particles
            .iter()
            .filter(|p| p.is_physical())
            .map(|p| p.mass)
            .sum()
    }

    /// Total momentum of the physical particles
    pub fn total_momentum(&self) -> Vector2<f64> {
        self.particles
            .iter()
            .filter(|p| p.is_physical())
            .map(|p| p.momentum())
            .fold(Vector2::zeros(), |acc, p| acc + p)
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.particles
            .iter()
            .filter(|p| p.is_physical())
            .map(|p| p.kinetic_energy())
            .sum()
    }

    /// Exact softened potential energy (O(N²), for diagnostics)
    pub fn potential_energy(&self) -> f64 {
        DirectGravity::new(self.config.gravitational_constant, self.config.softening)
            .potential_energy(&self.particles)
    }
}

fn validate_particle(x: f64, y: f64, vx: f64, vy: f64, mass: f64, density: f64) -> Result<()> {
    for (field, value) in [("mass", mass), ("density", density)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(SimError::InvalidParticle { field, value });
        }
    }
    for (field, value) in [("x", x), ("y", y), ("vx", vx), ("vy", vy)] {
        if !value.is_finite() {
            return Err(SimError::InvalidParticle { field, value });
        }
    }
    Ok(())
}

/// Two distinct mutable elements of a slice
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}
