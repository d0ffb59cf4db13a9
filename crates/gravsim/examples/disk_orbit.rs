//! Rotating disk example
//!
//! Places a disk of particles in circular orbit around a heavy central
//! particle and runs the fixed-timestep loop, reporting how well mass is
//! conserved and how the disk clumps as particles merge.
//!
//! Run with: RUST_LOG=info cargo run --package gravsim --example disk_orbit

use gravsim::scenario::{populate_disk, DiskParams, ScenarioParams};
use gravsim::{Simulation, SimulationConfig};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

fn main() {
    env_logger::init();

    println!("Barnes-Hut Disk: Particles Orbiting a Central Mass\n");
    println!("{}", "=".repeat(60));

    let config = SimulationConfig {
        parallel: true,
        ..Default::default()
    };
    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("bad configuration: {err}");
            return;
        }
    };

    let disk = DiskParams {
        count: 2_000,
        ..Default::default()
    };
    let mut rng = ChaChaRng::seed_from_u64(2024);
    if let Err(err) = populate_disk(&mut sim, &disk, &ScenarioParams::default(), &mut rng) {
        eprintln!("could not build disk: {err}");
        return;
    }

    let initial_mass = sim.total_mass();
    println!("\nInitial conditions:");
    println!("  Particles: {}", sim.particle_count());
    println!("  Central mass: {:.0}", disk.central_mass);
    println!(
        "  Disk radii: {:.0} to {:.0}",
        disk.inner_radius, disk.outer_radius
    );
    println!("  Total mass: {:.1}", initial_mass);

    // 60 frames per second for 20 seconds
    let frame_dt = 1.0 / 60.0;
    let frames = 60 * 20;
    let mut merges = 0;

    println!("\nRunning {} frames...", frames);
    for frame in 1..=frames {
        let report = sim.advance(frame_dt);
        merges += report.steps.merges;

        if frame % 120 == 0 {
            let stats = sim.tree_stats();
            println!(
                "t={:>6.2}: {:>5} particles, {:>4} merges, KE={:.3e}, tree nodes={}",
                sim.time(),
                sim.particle_count(),
                merges,
                sim.kinetic_energy(),
                stats.nodes
            );
        }
    }

    println!("\n{}", "=".repeat(60));
    let mass_error = ((sim.total_mass() - initial_mass) / initial_mass).abs();
    println!("Final diagnostics:");
    println!("  Particles left: {}", sim.particle_count());
    println!("  Merges: {}", merges);
    println!("  Mass error: {:.2e}", mass_error);

    if mass_error < 1e-12 {
        println!("✓ Mass conserved through every merge");
    } else {
        println!("✗ Mass drifted by {:.2e}", mass_error);
    }
}
