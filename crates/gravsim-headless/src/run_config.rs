//! YAML description of a headless run.
//!
//! ```yaml
//! seed: 7
//! duration: 30.0
//! frame_dt: 0.016666
//! report_every: 1.0
//! scenario:
//!   disk:
//!     count: 1500
//!     central_mass: 200000.0
//! particles:
//!   max_mass: 50
//! simulation:
//!   theta: 0.6
//!   parallel: true
//! ```
//!
//! Every field is optional. `simulation` takes any field of
//! [`SimulationConfig`], `particles` any field of [`ScenarioParams`].
//! Enum variants that carry data are written as single-key maps
//! (`disk: {..}`, `fixed_speed: 150.0`) rather than YAML `!tags`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use gravsim::scenario::{DiskParams, ScenarioParams};
use gravsim::SimulationConfig;
use serde::Deserialize;

/// Initial particle layout
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Random particles spread over the whole world
    Uniform { count: usize },
    /// A rotating disk around a central mass
    Disk(DiskParams),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RunConfig {
    pub seed: u64,
    /// Simulated seconds to run
    pub duration: f64,
    /// Wall-clock length of one frame fed to the accumulator
    pub frame_dt: f64,
    /// Simulated seconds between progress lines
    pub report_every: f64,
    /// Top the world back up to this many particles at every report
    pub repopulate_to: Option<usize>,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub scenario: ScenarioKind,
    pub particles: ScenarioParams,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub simulation: SimulationConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            duration: 10.0,
            frame_dt: 1.0 / 60.0,
            report_every: 1.0,
            repopulate_to: None,
            scenario: ScenarioKind::Uniform { count: 1_000 },
            particles: ScenarioParams::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RunConfig {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let config: RunConfig = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }
}
