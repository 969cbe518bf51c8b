//! Run configuration, loadable from TOML.
//!
//! ```toml
//! [simulation]
//! cells = 500
//! box_length = 50.0
//! timestep = 0.05
//! solver = "psatd"
//!
//! [[simulation.species]]
//! name = "electrons"
//! mass_to_charge = -1.0
//! ppc = 64
//! thermal = [0.001, 0.001, 0.001]
//! density = { kind = "uniform", n = 1.0 }
//!
//! [run]
//! iterations = 4000
//! record = "ey"
//! solvers = ["fdtd", "pstd", "psatd"]
//! output_dir = "output"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_SEED;
use crate::density::DensityProfile;
use crate::error::{ensure_positive, PicError, Result};
use crate::solver::SolverKind;
use crate::types::{Boundary, FieldComponent};

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Description of one particle species.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeciesConfig {
    pub name: String,
    /// Mass-to-charge ratio in units of the electron's magnitude; electrons
    /// are `-1`.
    pub mass_to_charge: f64,
    /// Particles per cell at the reference density.
    pub ppc: usize,
    #[serde(default)]
    pub drift: [f64; 3],
    #[serde(default)]
    pub thermal: [f64; 3],
    #[serde(default)]
    pub density: DensityProfile,
    #[serde(default)]
    pub boundary: Boundary,
}

impl SpeciesConfig {
    /// A cold, uniform, periodic species.
    pub fn new(name: &str, mass_to_charge: f64, ppc: usize) -> Self {
        SpeciesConfig {
            name: name.to_string(),
            mass_to_charge,
            ppc,
            drift: [0.0; 3],
            thermal: [0.0; 3],
            density: DensityProfile::default(),
            boundary: Boundary::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PicError::InvalidConfig(format!("species {}: {msg}", self.name)));

        if !self.mass_to_charge.is_finite() || self.mass_to_charge == 0.0 {
            return invalid(format!(
                "mass-to-charge ratio must be finite and non-zero, got {}",
                self.mass_to_charge
            ));
        }
        if self.ppc == 0 {
            return invalid("particles per cell must be positive, got 0".to_string());
        }
        if self.drift.iter().any(|v| !v.is_finite()) {
            return invalid(format!("drift velocity must be finite, got {:?}", self.drift));
        }
        if self.thermal.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid(format!(
                "thermal velocity must be finite and non-negative, got {:?}",
                self.thermal
            ));
        }
        self.density.validate()
    }
}

/// Everything needed to build a [`Simulation`](crate::simulation::Simulation).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub cells: usize,
    pub box_length: f64,
    pub timestep: f64,
    pub solver: SolverKind,
    /// Seed of the random stream used for thermal velocities.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub species: Vec<SpeciesConfig>,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cells == 0 {
            return Err(PicError::InvalidConfig(
                "cell count must be positive, got 0".to_string(),
            ));
        }
        ensure_positive("box length", self.box_length)?;
        ensure_positive("timestep", self.timestep)?;

        let mut names = HashSet::new();
        for species in &self.species {
            species.validate()?;
            if !names.insert(species.name.as_str()) {
                return Err(PicError::InvalidConfig(format!(
                    "duplicate species name {}",
                    species.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    /// Cold electron plasma in a 50 c/ω_p box, advanced with PSATD.
    fn default() -> Self {
        SimulationConfig {
            cells: 500,
            box_length: 50.0,
            timestep: 0.05,
            solver: SolverKind::Psatd,
            seed: DEFAULT_SEED,
            species: vec![SpeciesConfig {
                thermal: [0.001; 3],
                ..SpeciesConfig::new("electrons", -1.0, 64)
            }],
        }
    }
}

fn default_iterations() -> u64 {
    4000
}

fn default_record() -> FieldComponent {
    FieldComponent::Ey
}

fn default_solvers() -> Vec<SolverKind> {
    SolverKind::ALL.to_vec()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// What the binary does with a simulation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_iterations")]
    pub iterations: u64,
    /// Field component recorded every iteration.
    #[serde(default = "default_record")]
    pub record: FieldComponent,
    /// Solvers to sweep; each gets an independent simulation.
    #[serde(default = "default_solvers")]
    pub solvers: Vec<SolverKind>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            iterations: default_iterations(),
            record: default_record(),
            solvers: default_solvers(),
            output_dir: default_output_dir(),
        }
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl Settings {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        if self.run.solvers.is_empty() {
            return Err(PicError::InvalidConfig(
                "at least one solver must be selected".to_string(),
            ));
        }
        Ok(())
    }
}
