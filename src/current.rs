//! Charge and current deposition onto the grid.
//!
//! Charge and the transverse currents `jy`, `jz` live on grid nodes, the
//! longitudinal current `jx` on half nodes. Deposition uses the linear
//! (cloud-in-cell) shape, and `jx` is built from the particle displacement so
//! that the discrete continuity equation holds exactly:
//!
//! \[
//! \rho^{n}_i - \rho^{n-1}_i + \frac{\Delta t}{\Delta x}\left(j_{x,i+1/2} - j_{x,i-1/2}\right) = 0
//! \]

use ndarray::Array1;

use crate::types::{Boundary, Grid, Particle};

/// Grid-wide charge and current accumulators shared by all species.
#[derive(Debug, Clone, PartialEq)]
pub struct Current {
    pub rho: Array1<f64>,
    pub jx: Array1<f64>,
    pub jy: Array1<f64>,
    pub jz: Array1<f64>,
}

impl Current {
    pub fn new(nx: usize) -> Self {
        Current {
            rho: Array1::zeros(nx),
            jx: Array1::zeros(nx),
            jy: Array1::zeros(nx),
            jz: Array1::zeros(nx),
        }
    }

    pub fn len(&self) -> usize {
        self.rho.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rho.is_empty()
    }

    /// Clears all accumulators. Must run once per iteration before any deposit.
    pub fn zero(&mut self) {
        self.rho.fill(0.0);
        self.jx.fill(0.0);
        self.jy.fill(0.0);
        self.jz.fill(0.0);
    }

    /// Adds a partial accumulator into this one.
    pub fn add(&mut self, other: &Current) {
        self.rho += &other.rho;
        self.jx += &other.jx;
        self.jy += &other.jy;
        self.jz += &other.jz;
    }

    pub fn total_charge(&self) -> f64 {
        self.rho.sum()
    }
}

/// Deposits the charge of `parts` with weights `(1 - x, x)` on the two nodes
/// bounding each particle.
pub fn deposit_charge(rho: &mut Array1<f64>, parts: &[Particle], q: f64, grid: &Grid) {
    for part in parts {
        rho[part.ix] += (1.0 - part.x) * q;
        rho[grid.next(part.ix)] += part.x * q;
    }
}

/// Maps a node index of the unfolded path back into the box.
#[inline(always)]
fn fold_node(j: i64, nx: i64, boundary: Boundary) -> usize {
    let j = match boundary {
        Boundary::Reflective if j < 0 => -j,
        Boundary::Reflective if j > nx => 2 * nx - j,
        _ => j,
    };
    j.rem_euclid(nx) as usize
}

/// Maps a cell (half node) index of the unfolded path back into the box,
/// returning the sign the longitudinal current picks up.
#[inline(always)]
fn fold_cell(c: i64, nx: i64, boundary: Boundary) -> (usize, f64) {
    match boundary {
        Boundary::Reflective if c < 0 => ((-1 - c).rem_euclid(nx) as usize, -1.0),
        Boundary::Reflective if c >= nx => ((2 * nx - 1 - c).rem_euclid(nx) as usize, -1.0),
        _ => (c.rem_euclid(nx) as usize, 1.0),
    }
}

/// Deposits the current of `parts` for their last displacement.
///
/// The path `x^n - dp -> x^n` comes from the displacement recorded by the
/// last push, so particles that have not moved yet carry no `jx`. The path
/// is split at cell boundaries;
/// each piece adds its whole flux to the half node of its cell, and its
/// share of `q v_y`, `q v_z` to the two bounding nodes, weighted at the
/// piece midpoint.
pub fn deposit_current(
    current: &mut Current,
    parts: &[Particle],
    q: f64,
    grid: &Grid,
    dt: f64,
    boundary: Boundary,
) {
    let nx = grid.nx as i64;
    let jx_scale = q * grid.dx / dt;

    for part in parts {
        let p_new = part.cell_position();
        let p_old = p_new - part.dp;
        let path = p_new - p_old;
        let forward = path >= 0.0;

        let mut a = p_old;
        loop {
            let c = if forward { a.floor() } else { a.ceil() - 1.0 };
            let b = if forward {
                p_new.min(c + 1.0)
            } else {
                p_new.max(c)
            };

            let (cell, sign) = fold_cell(c as i64, nx, boundary);
            current.jx[cell] += sign * jx_scale * (b - a);

            let frac = if path != 0.0 { (b - a) / path } else { 1.0 };
            let mid = 0.5 * (a + b) - c;
            let lo = fold_node(c as i64, nx, boundary);
            let hi = fold_node(c as i64 + 1, nx, boundary);
            let wy = q * part.v[1] * frac;
            let wz = q * part.v[2] * frac;
            current.jy[lo] += wy * (1.0 - mid);
            current.jy[hi] += wy * mid;
            current.jz[lo] += wz * (1.0 - mid);
            current.jz[hi] += wz * mid;

            if b == p_new {
                break;
            }
            a = b;
        }
    }
}
