//! The field-solver contract and the closed set of solver kinds.

use ndarray::Array1;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::current::Current;
use crate::error::PicError;
use crate::fdtd::FdtdSolver;
use crate::fields::EmFields;
use crate::spectral::{SpectralSolver, SpectralVariant};
use crate::types::{FieldComponent, Grid};

/// Available field-advance strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Real-space finite differences on the Yee grid.
    Fdtd,
    /// Spectral derivatives, leapfrog time update.
    Pstd,
    /// Spectral derivatives, exact analytic time update per mode.
    Psatd,
}

impl SolverKind {
    pub const ALL: [SolverKind; 3] = [SolverKind::Fdtd, SolverKind::Pstd, SolverKind::Psatd];

    pub fn name(self) -> &'static str {
        match self {
            SolverKind::Fdtd => "fdtd",
            SolverKind::Pstd => "pstd",
            SolverKind::Psatd => "psatd",
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverKind {
    type Err = PicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fdtd" => Ok(SolverKind::Fdtd),
            "pstd" => Ok(SolverKind::Pstd),
            "psatd" => Ok(SolverKind::Psatd),
            _ => Err(PicError::UnknownSolver(s.to_string())),
        }
    }
}

/// A field solver owns the field state and advances it by one timestep.
///
/// `advance` runs exactly once per iteration, after deposition and before the
/// next particle push. On entry the fields are at time `n - 1` and `current`
/// holds `J^{n-1/2}`; on exit the fields are at time `n`.
pub trait FieldSolver: Send + fmt::Debug {
    fn kind(&self) -> SolverKind;

    fn advance(&mut self, dt: f64, current: &Current);

    fn fields(&self) -> &EmFields;

    fn fields_mut(&mut self) -> &mut EmFields;

    /// Copy of one component across all cells.
    fn sample(&self, component: FieldComponent) -> Array1<f64> {
        self.fields().component(component).clone()
    }
}

/// Builds a solver of the given kind, starting from `fields`.
pub fn build_solver(kind: SolverKind, grid: &Grid, fields: EmFields) -> Box<dyn FieldSolver> {
    match kind {
        SolverKind::Fdtd => Box::new(FdtdSolver::new(*grid, fields)),
        SolverKind::Pstd => Box::new(SpectralSolver::new(*grid, SpectralVariant::Pstd, fields)),
        SolverKind::Psatd => Box::new(SpectralSolver::new(*grid, SpectralVariant::Psatd, fields)),
    }
}
