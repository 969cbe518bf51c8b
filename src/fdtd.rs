//! Finite-difference time-domain solver.
//!
//! Maxwell's equations in 1-D (c = 1) on the Yee grid:
//!
//! \[
//! \partial_t B_y = \partial_x E_z,\quad \partial_t B_z = -\partial_x E_y,\quad
//! \partial_t E_y = -\partial_x B_z - j_y,\quad \partial_t E_z = \partial_x B_y - j_z
//! \]
//!
//! The update is B half step, E full step, B half step, which keeps E and B
//! at the same integer time. Stable for `dt <= dx`; this is not checked.

use crate::current::Current;
use crate::fields::EmFields;
use crate::solver::{FieldSolver, SolverKind};
use crate::types::Grid;

#[derive(Debug, Clone)]
pub struct FdtdSolver {
    grid: Grid,
    fields: EmFields,
}

impl FdtdSolver {
    pub fn new(grid: Grid, fields: EmFields) -> Self {
        FdtdSolver { grid, fields }
    }

    /// Advances B by `dt` using the curl of E. B sits on half nodes, so the
    /// difference is forward.
    fn advance_b(&mut self, dt: f64) {
        let dt_dx = dt / self.grid.dx;
        let f = &mut self.fields;
        for i in 0..self.grid.nx {
            let ip = self.grid.next(i);
            f.by[i] += dt_dx * (f.ez[ip] - f.ez[i]);
            f.bz[i] -= dt_dx * (f.ey[ip] - f.ey[i]);
        }
    }

    /// Advances E by `dt` using the curl of B and the current. E sits on
    /// nodes, so the difference is backward.
    fn advance_e(&mut self, dt: f64, current: &Current) {
        let dt_dx = dt / self.grid.dx;
        let f = &mut self.fields;
        for i in 0..self.grid.nx {
            let im = self.grid.prev(i);
            f.ey[i] -= dt_dx * (f.bz[i] - f.bz[im]) + dt * current.jy[i];
            f.ez[i] += dt_dx * (f.by[i] - f.by[im]) - dt * current.jz[i];
        }
        f.advance_longitudinal(dt, &current.jx);
    }
}

impl FieldSolver for FdtdSolver {
    fn kind(&self) -> SolverKind {
        SolverKind::Fdtd
    }

    fn advance(&mut self, dt: f64, current: &Current) {
        self.advance_b(0.5 * dt);
        self.advance_e(dt, current);
        self.advance_b(0.5 * dt);
    }

    fn fields(&self) -> &EmFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut EmFields {
        &mut self.fields
    }
}
