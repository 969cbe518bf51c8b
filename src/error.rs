//! Error types for em1d.

use thiserror::Error;

use crate::simulation::Stage;

#[derive(Debug, Error)]
pub enum PicError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown field solver: {0} (expected fdtd, pstd or psatd)")]
    UnknownSolver(String),

    #[error("Custom density returned {value} at x = {position}")]
    InvalidDensity { position: f64, value: f64 },

    #[error("Unable to grow particle buffer of species {species} to {requested} particles")]
    Allocation { species: String, requested: usize },

    #[error("Pipeline stage out of order: expected {expected}, called {called}")]
    OutOfOrder { expected: Stage, called: Stage },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PicError>;

/// Fails with `InvalidConfig` unless `value` is finite and strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PicError::InvalidConfig(format!(
            "{name} must be positive, got {value}"
        )))
    }
}
