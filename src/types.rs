//! Defines the types shared by the particle and field sides of the simulation.

use serde::Deserialize;
use std::fmt;

use crate::error::{ensure_positive, PicError, Result};

/// Geometry of the periodic 1-D grid.
///
/// Nodes sit at `i * dx`, half nodes at `(i + 1/2) * dx`, for `i` in `0..nx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub nx: usize,
    pub dx: f64,
    pub box_length: f64,
}

impl Grid {
    pub fn new(nx: usize, box_length: f64) -> Result<Self> {
        if nx == 0 {
            return Err(PicError::InvalidConfig(
                "cell count must be positive, got 0".to_string(),
            ));
        }
        ensure_positive("box length", box_length)?;
        Ok(Grid {
            nx,
            dx: box_length / nx as f64,
            box_length,
        })
    }

    /// Position of grid node `i`.
    pub fn node(&self, i: usize) -> f64 {
        i as f64 * self.dx
    }

    /// Node positions, one per cell.
    pub fn coordinates(&self) -> ndarray::Array1<f64> {
        ndarray::Array1::from_shape_fn(self.nx, |i| self.node(i))
    }

    /// Index of the node following `i`, wrapping at the box edge.
    #[inline(always)]
    pub fn next(&self, i: usize) -> usize {
        if i + 1 == self.nx {
            0
        } else {
            i + 1
        }
    }

    /// Index of the node preceding `i`, wrapping at the box edge.
    #[inline(always)]
    pub fn prev(&self, i: usize) -> usize {
        if i == 0 {
            self.nx - 1
        } else {
            i - 1
        }
    }
}

/// A macro-particle.
///
/// The position is split into the cell index and the offset inside the cell so
/// that precision does not degrade across large boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Cell index, in `0..nx` for every particle stored in a species.
    pub ix: usize,
    /// Offset inside the cell, in `[0, 1)`.
    pub x: f64,
    /// Velocity `[vx, vy, vz]` in units of c.
    pub v: [f64; 3],
    /// Displacement in cells during the last push, zero until the first one.
    /// After a reflection it is the displacement of the mirrored path.
    pub dp: f64,
}

impl Particle {
    pub fn new(ix: usize, x: f64, v: [f64; 3]) -> Self {
        Particle { ix, x, v, dp: 0.0 }
    }

    /// Position in cell units.
    #[inline(always)]
    pub fn cell_position(&self) -> f64 {
        self.ix as f64 + self.x
    }

    /// Position in simulation units.
    pub fn position(&self, dx: f64) -> f64 {
        self.cell_position() * dx
    }
}

/// What happens to a particle that leaves the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Re-enters on the opposite side with the same offset and velocity.
    #[default]
    Periodic,
    /// Removed from the species.
    Open,
    /// Mirrored back into the box with the normal velocity reversed.
    Reflective,
}

/// Grid quantities that can be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldComponent {
    Ex,
    Ey,
    Ez,
    Bx,
    By,
    Bz,
}

impl FieldComponent {
    pub const ALL: [FieldComponent; 6] = [
        FieldComponent::Ex,
        FieldComponent::Ey,
        FieldComponent::Ez,
        FieldComponent::Bx,
        FieldComponent::By,
        FieldComponent::Bz,
    ];

    /// Whether the component is sampled at half nodes on the Yee grid.
    pub fn on_half_nodes(self) -> bool {
        matches!(
            self,
            FieldComponent::Ex | FieldComponent::By | FieldComponent::Bz
        )
    }
}

impl fmt::Display for FieldComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldComponent::Ex => "e1",
            FieldComponent::Ey => "e2",
            FieldComponent::Ez => "e3",
            FieldComponent::Bx => "b1",
            FieldComponent::By => "b2",
            FieldComponent::Bz => "b3",
        };
        write!(f, "{name}")
    }
}

/// Axes available for phase-space histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseQuantity {
    X1,
    V1,
    V2,
    V3,
}

impl PhaseQuantity {
    pub fn value(self, part: &Particle, dx: f64) -> f64 {
        match self {
            PhaseQuantity::X1 => part.position(dx),
            PhaseQuantity::V1 => part.v[0],
            PhaseQuantity::V2 => part.v[1],
            PhaseQuantity::V3 => part.v[2],
        }
    }
}
