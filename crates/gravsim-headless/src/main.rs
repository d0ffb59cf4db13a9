//! Runs a gravsim scenario without a window and logs its progress.

mod run_config;

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use gravsim::scenario::{populate_disk, populate_uniform, repopulate};
use gravsim::Simulation;
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

use crate::run_config::{RunConfig, ScenarioKind};

#[derive(Parser, Debug)]
#[command(about = "Headless fixed-timestep driver for gravsim")]
struct Args {
    /// Scenario file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the seed from the file
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the simulated duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Spreads force evaluation over all cores
    #[arg(long)]
    parallel: bool,
}

fn load_run_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_yaml_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(duration) = args.duration {
        config.duration = duration;
    }
    config.simulation.parallel |= args.parallel;

    ensure!(
        config.frame_dt.is_finite() && config.frame_dt > 0.0,
        "frame_dt must be positive, got {}",
        config.frame_dt
    );
    ensure!(
        config.duration.is_finite(),
        "duration must be finite, got {}",
        config.duration
    );
    ensure!(
        config.report_every > 0.0,
        "report_every must be positive, got {}",
        config.report_every
    );
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let run = load_run_config(&args)?;

    let mut sim = Simulation::new(run.simulation.clone()).context("invalid simulation config")?;
    let mut rng = ChaChaRng::seed_from_u64(run.seed);

    match run.scenario {
        ScenarioKind::Uniform { count } => {
            populate_uniform(&mut sim, count, &run.particles, &mut rng)?;
        }
        ScenarioKind::Disk(disk) => {
            populate_disk(&mut sim, &disk, &run.particles, &mut rng)?;
        }
    }

    let initial_mass = sim.total_mass();
    log::info!(
        "starting: {} particles, total mass {:.1}, seed {}",
        sim.particle_count(),
        initial_mass,
        run.seed
    );

    let mut next_report = run.report_every;
    let (mut merges, mut bounces, mut dropped) = (0, 0, 0.0);

    while sim.time() < run.duration {
        let frame = sim.advance(run.frame_dt);
        merges += frame.steps.merges;
        bounces += frame.steps.bounces;
        dropped += frame.dropped_time;

        if sim.time() >= next_report {
            next_report += run.report_every;
            let stats = sim.tree_stats();
            log::info!(
                "t={:.2} particles={} merges={} bounces={} KE={:.3e} nodes={} overflowing={}",
                sim.time(),
                sim.particle_count(),
                merges,
                bounces,
                sim.kinetic_energy(),
                stats.nodes,
                stats.overflowing_leaves
            );
            if stats.pool_exhausted {
                log::warn!("quadtree pool exhausted; consider a larger max_nodes");
            }

            if let Some(target) = run.repopulate_to {
                let made = repopulate(&mut sim, target, &run.particles, &mut rng)?;
                if made > 0 {
                    log::info!("repopulated {made} particles");
                }
            }
        }
    }

    let momentum = sim.total_momentum();
    log::info!(
        "finished at t={:.2}: {} particles, mass {:.1} (start {:.1}), momentum ({:.3}, {:.3})",
        sim.time(),
        sim.particle_count(),
        sim.total_mass(),
        initial_mass,
        momentum.x,
        momentum.y
    );
    if dropped > 0.0 {
        log::info!("{dropped:.3}s of simulated time dropped by the catch-up limit");
    }

    Ok(())
}
