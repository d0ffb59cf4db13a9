//! Collision example
//!
//! Fires a light particle at a heavy one, first with merging and then with
//! elastic bouncing, and prints what each mode conserves.
//!
//! Run with: RUST_LOG=debug cargo run --package gravsim --example merge_demo

use gravsim::config::CollisionMode;
use gravsim::{Simulation, SimulationConfig, StepReport};

fn run(mode: CollisionMode) -> Result<(), gravsim::SimError> {
    let mut sim = Simulation::new(SimulationConfig {
        collision_mode: mode,
        // Weak gravity so the collision dominates
        gravitational_constant: 1e-6,
        ..Default::default()
    })?;

    let heavy = sim.spawn_particle(0.0, 0.0, 0.0, 0.0, 400.0, 2.0)?;
    let light = sim.spawn_particle(120.0, 3.0, -40.0, 0.0, 50.0, 1.0)?;

    let momentum = sim.total_momentum();
    let energy = sim.kinetic_energy();
    println!("\n{mode:?} mode");
    println!("  Before: mass={:.1}, p=({:.2}, {:.2}), KE={:.2}", sim.total_mass(), momentum.x, momentum.y, energy);

    let mut total = StepReport::default();
    for _ in 0..400 {
        let report = sim.step_simulation(0.01);
        total.merges += report.merges;
        total.bounces += report.bounces;
    }

    let momentum = sim.total_momentum();
    println!(
        "  After:  mass={:.1}, p=({:.2}, {:.2}), KE={:.2}",
        sim.total_mass(),
        momentum.x,
        momentum.y,
        sim.kinetic_energy()
    );
    println!("  Merges: {}, bounces: {}", total.merges, total.bounces);
    println!(
        "  Heavy alive: {}, light alive: {}",
        sim.is_alive(heavy),
        sim.is_alive(light)
    );
    if let Some(radius) = sim.radius(heavy) {
        println!("  Heavy radius: {:.2}", radius);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    println!("Collision Demo: Merge vs Bounce\n");
    println!("{}", "=".repeat(60));

    for mode in [CollisionMode::Merge, CollisionMode::Bounce] {
        if let Err(err) = run(mode) {
            eprintln!("{mode:?} run failed: {err}");
        }
    }
}
