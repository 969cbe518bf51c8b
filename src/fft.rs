//! Complex FFT of grid-sized arrays, backed by `rustfft`.

use ndarray::Array1;
use num_complex::Complex;
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

use crate::constants::PI;

/// Forward and inverse transforms of one fixed length.
///
/// The forward transform uses the \(e^{-ikx}\) convention; the inverse is
/// normalized so that `inverse(forward(f)) == f`.
pub struct FftEngine {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftEngine").field("len", &self.len).finish()
    }
}

impl FftEngine {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        FftEngine {
            len,
            forward,
            inverse,
            scratch: vec![Complex::zero(); scratch_len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn forward(&mut self, buffer: &mut [Complex<f64>]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    pub fn inverse(&mut self, buffer: &mut [Complex<f64>]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
        let norm = 1.0 / self.len as f64;
        for v in buffer.iter_mut() {
            *v *= norm;
        }
    }

    /// Transforms a real array into `out`.
    pub fn forward_real(&mut self, data: &Array1<f64>, out: &mut [Complex<f64>]) {
        for (o, &v) in out.iter_mut().zip(data.iter()) {
            *o = Complex::new(v, 0.0);
        }
        self.forward(out);
    }

    /// Transforms `spectrum` back in place and stores its real part in `data`.
    pub fn inverse_real(&mut self, spectrum: &mut [Complex<f64>], data: &mut Array1<f64>) {
        self.inverse(spectrum);
        for (d, v) in data.iter_mut().zip(spectrum.iter()) {
            *d = v.re;
        }
    }
}

/// Signed wavenumbers of a length-`n` transform with sample spacing `dx`,
/// in FFT order: `0, 1, ..., n/2, -(n-1)/2, ..., -1` times `2π / (n dx)`.
pub fn wavenumbers(n: usize, dx: f64) -> Array1<f64> {
    let dk = 2.0 * PI / (n as f64 * dx);
    Array1::from_shape_fn(n, |i| {
        if i <= n / 2 {
            i as f64 * dk
        } else {
            (i as f64 - n as f64) * dk
        }
    })
}

/// Index of the Nyquist mode, present only for even lengths.
pub fn nyquist_index(n: usize) -> Option<usize> {
    if n % 2 == 0 {
        Some(n / 2)
    } else {
        None
    }
}
