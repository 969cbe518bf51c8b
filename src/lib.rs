//! One-dimensional electromagnetic particle-in-cell (1D3V) engine.
//!
//! Particles move along `x` with three velocity components; all six field
//! components are kept on a periodic Yee grid. Units are normalized: `c = 1`,
//! time in `1/ω_p`, length in `c/ω_p`. The field can be advanced with a
//! finite-difference (FDTD) or a spectral (PSTD, PSATD) solver, which makes
//! the engine a test bench for comparing solvers against the plasma
//! dispersion relation \(\omega^2 = \omega_p^2 + k^2 c^2\).

pub mod config;
pub mod constants;
pub mod current;
pub mod density;
pub mod error;
pub mod fdtd;
pub mod fft;
pub mod fields;
pub mod simulation;
pub mod solver;
pub mod species;
pub mod spectral;
pub mod types;
pub mod utils;

pub use config::{RunConfig, Settings, SimulationConfig, SpeciesConfig};
pub use current::Current;
pub use density::DensityProfile;
pub use error::{PicError, Result};
pub use fields::EmFields;
pub use simulation::{Simulation, Stage};
pub use solver::{FieldSolver, SolverKind};
pub use species::Species;
pub use types::{Boundary, FieldComponent, Grid, Particle, PhaseQuantity};
