//! Spectral field solvers (PSTD and PSATD).
//!
//! The transverse fields and currents are transformed to wavenumber space,
//! every mode is advanced independently and the result is transformed back.
//! `by` and `bz` are sampled on half nodes; after the forward transform they
//! are shifted to node representation with \(e^{-ik\Delta x/2}\) so that the
//! derivative is simply \(ik\), and shifted back before the inverse transform.
//!
//! In node representation each polarization obeys (c = 1)
//!
//! \[
//! \partial_t E_y = -ik B_z - J_y,\quad \partial_t B_z = -ik E_y,\qquad
//! \partial_t E_z = ik B_y - J_z,\quad \partial_t B_y = ik E_z
//! \]
//!
//! PSTD integrates this with a leapfrog in time (stable for
//! `dt < 2 dx / π`). PSATD uses the exact solution over one step with the
//! current held constant, so the source-free part has no time
//! discretization error.
//!
//! The Nyquist mode of an even grid has no well-defined half-node shift and
//! is removed every step.

use itertools::izip;
use ndarray::Array1;
use num_complex::Complex;
use num_traits::Zero;

use crate::current::Current;
use crate::fft::{nyquist_index, wavenumbers, FftEngine};
use crate::fields::EmFields;
use crate::solver::{FieldSolver, SolverKind};
use crate::types::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectralVariant {
    Pstd,
    Psatd,
}

/// Per-mode PSATD coefficients for one timestep.
#[derive(Debug, Clone, Copy)]
struct Propagator {
    c: f64,
    s: f64,
    /// `sin(k dt) / k`, equal to `dt` at `k = 0`.
    s_over_k: f64,
    /// `(1 - cos(k dt)) / k`, zero at `k = 0`.
    omc_over_k: f64,
}

impl Propagator {
    fn new(k: f64, dt: f64) -> Self {
        if k == 0.0 {
            Propagator {
                c: 1.0,
                s: 0.0,
                s_over_k: dt,
                omc_over_k: 0.0,
            }
        } else {
            let (s, c) = (k * dt).sin_cos();
            Propagator {
                c,
                s,
                s_over_k: s / k,
                omc_over_k: (1.0 - c) / k,
            }
        }
    }
}

#[derive(Debug)]
pub struct SpectralSolver {
    variant: SpectralVariant,
    fields: EmFields,
    fft: FftEngine,
    k: Array1<f64>,
    /// \(e^{-ik\Delta x/2}\), half node to node representation.
    to_node: Vec<Complex<f64>>,
    nyquist: Option<usize>,
    propagators: Vec<Propagator>,
    propagator_dt: f64,
    ey: Vec<Complex<f64>>,
    ez: Vec<Complex<f64>>,
    by: Vec<Complex<f64>>,
    bz: Vec<Complex<f64>>,
    jy: Vec<Complex<f64>>,
    jz: Vec<Complex<f64>>,
}

impl SpectralSolver {
    pub fn new(grid: Grid, variant: SpectralVariant, fields: EmFields) -> Self {
        let nx = grid.nx;
        let k = wavenumbers(nx, grid.dx);
        let to_node = k
            .iter()
            .map(|&k| Complex::from_polar(1.0, -0.5 * k * grid.dx))
            .collect();

        SpectralSolver {
            variant,
            fields,
            fft: FftEngine::new(nx),
            k,
            to_node,
            nyquist: nyquist_index(nx),
            propagators: Vec::with_capacity(nx),
            propagator_dt: f64::NAN,
            ey: vec![Complex::zero(); nx],
            ez: vec![Complex::zero(); nx],
            by: vec![Complex::zero(); nx],
            bz: vec![Complex::zero(); nx],
            jy: vec![Complex::zero(); nx],
            jz: vec![Complex::zero(); nx],
        }
    }

    pub fn variant(&self) -> SpectralVariant {
        self.variant
    }

    pub fn wavenumbers(&self) -> &Array1<f64> {
        &self.k
    }

    fn to_spectral(&mut self, current: &Current) {
        let fft = &mut self.fft;
        fft.forward_real(&self.fields.ey, &mut self.ey);
        fft.forward_real(&self.fields.ez, &mut self.ez);
        fft.forward_real(&self.fields.by, &mut self.by);
        fft.forward_real(&self.fields.bz, &mut self.bz);
        fft.forward_real(&current.jy, &mut self.jy);
        fft.forward_real(&current.jz, &mut self.jz);

        for (by, bz, shift) in izip!(&mut self.by, &mut self.bz, &self.to_node) {
            *by *= shift;
            *bz *= shift;
        }
    }

    fn to_spatial(&mut self) {
        if let Some(n) = self.nyquist {
            for f in [&mut self.ey, &mut self.ez, &mut self.by, &mut self.bz] {
                f[n] = Complex::zero();
            }
        }
        for (by, bz, shift) in izip!(&mut self.by, &mut self.bz, &self.to_node) {
            *by *= shift.conj();
            *bz *= shift.conj();
        }

        let fft = &mut self.fft;
        fft.inverse_real(&mut self.ey, &mut self.fields.ey);
        fft.inverse_real(&mut self.ez, &mut self.fields.ez);
        fft.inverse_real(&mut self.by, &mut self.fields.by);
        fft.inverse_real(&mut self.bz, &mut self.fields.bz);
    }

    fn pstd_step(&mut self, dt: f64) {
        let half = 0.5 * dt;
        for (ey, ez, by, bz, jy, jz, &k) in izip!(
            &mut self.ey,
            &mut self.ez,
            &mut self.by,
            &mut self.bz,
            &self.jy,
            &self.jz,
            &self.k
        ) {
            let ik = Complex::new(0.0, k);
            *bz -= half * ik * *ey;
            *by += half * ik * *ez;
            *ey += dt * (-ik * *bz - *jy);
            *ez += dt * (ik * *by - *jz);
            *bz -= half * ik * *ey;
            *by += half * ik * *ez;
        }
    }

    fn update_propagators(&mut self, dt: f64) {
        if self.propagator_dt == dt {
            return;
        }
        self.propagators.clear();
        self.propagators
            .extend(self.k.iter().map(|&k| Propagator::new(k, dt)));
        self.propagator_dt = dt;
    }

    fn psatd_step(&mut self, dt: f64) {
        self.update_propagators(dt);
        let i = Complex::<f64>::i();
        for (ey, ez, by, bz, jy, jz, p) in izip!(
            &mut self.ey,
            &mut self.ez,
            &mut self.by,
            &mut self.bz,
            &self.jy,
            &self.jz,
            &self.propagators
        ) {
            let (e, b) = (*ey, *bz);
            *ey = p.c * e - i * p.s * b - p.s_over_k * *jy;
            *bz = -i * p.s * e + p.c * b + i * p.omc_over_k * *jy;

            let (e, b) = (*ez, *by);
            *ez = p.c * e + i * p.s * b - p.s_over_k * *jz;
            *by = i * p.s * e + p.c * b - i * p.omc_over_k * *jz;
        }
    }
}

impl FieldSolver for SpectralSolver {
    fn kind(&self) -> SolverKind {
        match self.variant {
            SpectralVariant::Pstd => SolverKind::Pstd,
            SpectralVariant::Psatd => SolverKind::Psatd,
        }
    }

    fn advance(&mut self, dt: f64, current: &Current) {
        self.to_spectral(current);
        match self.variant {
            SpectralVariant::Pstd => self.pstd_step(dt),
            SpectralVariant::Psatd => self.psatd_step(dt),
        }
        self.to_spatial();
        self.fields.advance_longitudinal(dt, &current.jx);
    }

    fn fields(&self) -> &EmFields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut EmFields {
        &mut self.fields
    }
}
