//! Density profiles and particle placement for injection.
//!
//! Every profile is a reference density `n` times a shape function. The shape
//! sets where particles are placed and how many; `n` only scales the charge
//! carried by each particle.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

use crate::error::{ensure_positive, PicError, Result};
use crate::types::Grid;

/// A user-supplied density shape, `x -> f(x)`.
///
/// The function must return finite, non-negative values; anything else makes
/// injection fail.
#[derive(Clone)]
pub struct CustomDensity(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl CustomDensity {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        CustomDensity(Arc::new(function))
    }

    fn call(&self, x: f64) -> Result<f64> {
        let value = (self.0)(x);
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(PicError::InvalidDensity { position: x, value })
        }
    }
}

impl fmt::Debug for CustomDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomDensity(<fn>)")
    }
}

fn unit_density() -> f64 {
    1.0
}

/// Target macroscopic density of a species.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DensityProfile {
    /// Constant density everywhere.
    Uniform {
        #[serde(default = "unit_density")]
        n: f64,
    },
    /// Zero before `start`, `n` after.
    Step {
        #[serde(default = "unit_density")]
        n: f64,
        start: f64,
    },
    /// `n` inside `[start, end)`, zero outside.
    Slab {
        #[serde(default = "unit_density")]
        n: f64,
        start: f64,
        end: f64,
    },
    /// Linear from `ramp[0]` at `start` to `ramp[1]` at `end`, zero outside.
    Ramp {
        #[serde(default = "unit_density")]
        n: f64,
        start: f64,
        end: f64,
        ramp: [f64; 2],
    },
    /// Arbitrary shape, only constructible from code.
    #[serde(skip)]
    Custom { n: f64, function: CustomDensity },
}

impl Default for DensityProfile {
    fn default() -> Self {
        DensityProfile::Uniform { n: 1.0 }
    }
}

impl DensityProfile {
    pub fn custom<F>(n: f64, function: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        DensityProfile::Custom {
            n,
            function: CustomDensity::new(function),
        }
    }

    /// Reference density multiplying the profile shape.
    pub fn reference_density(&self) -> f64 {
        match *self {
            DensityProfile::Uniform { n }
            | DensityProfile::Step { n, .. }
            | DensityProfile::Slab { n, .. }
            | DensityProfile::Ramp { n, .. }
            | DensityProfile::Custom { n, .. } => n,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("reference density", self.reference_density())?;
        match *self {
            DensityProfile::Slab { start, end, .. } | DensityProfile::Ramp { start, end, .. }
                if !(start <= end) =>
            {
                Err(PicError::InvalidConfig(format!(
                    "density start ({start}) must not exceed end ({end})"
                )))
            }
            DensityProfile::Ramp { ramp, .. }
                if ramp.iter().any(|r| !r.is_finite() || *r < 0.0) =>
            {
                Err(PicError::InvalidConfig(format!(
                    "ramp densities must be finite and non-negative, got {ramp:?}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Profile shape at `x`, without the reference density.
    pub fn shape(&self, x: f64) -> Result<f64> {
        let value = match self {
            DensityProfile::Uniform { .. } => 1.0,
            DensityProfile::Step { start, .. } => {
                if x >= *start {
                    1.0
                } else {
                    0.0
                }
            }
            DensityProfile::Slab { start, end, .. } => {
                if x >= *start && x < *end {
                    1.0
                } else {
                    0.0
                }
            }
            DensityProfile::Ramp {
                start, end, ramp, ..
            } => {
                if x < *start || x > *end || end <= start {
                    0.0
                } else {
                    ramp[0] + (ramp[1] - ramp[0]) * (x - start) / (end - start)
                }
            }
            DensityProfile::Custom { function, .. } => function.call(x)?,
        };
        Ok(value)
    }

    /// Target density at `x`.
    pub fn evaluate(&self, x: f64) -> Result<f64> {
        Ok(self.reference_density() * self.shape(x)?)
    }

    /// Integral of the shape over `[a, b]`, in simulation units.
    ///
    /// Custom profiles use the trapezoid rule, matching what injection does.
    pub fn integral(&self, a: f64, b: f64) -> Result<f64> {
        let overlap = |lo: f64, hi: f64| (b.min(hi) - a.max(lo)).max(0.0);
        let value = match self {
            DensityProfile::Uniform { .. } => b - a,
            DensityProfile::Step { start, .. } => overlap(*start, f64::INFINITY),
            DensityProfile::Slab { start, end, .. } => overlap(*start, *end),
            DensityProfile::Ramp {
                start, end, ramp, ..
            } => {
                let (a, b) = (a.max(*start), b.min(*end));
                if b <= a || end <= start {
                    0.0
                } else {
                    let slope = (ramp[1] - ramp[0]) / (end - start);
                    (b - a) * (ramp[0] + slope * (0.5 * (a + b) - start))
                }
            }
            DensityProfile::Custom { function, .. } => {
                0.5 * (function.call(a)? + function.call(b)?) * (b - a)
            }
        };
        Ok(value)
    }

    /// Number of particles a cell should receive on average.
    pub fn expected_particles(&self, cell: usize, grid: &Grid, ppc: usize) -> Result<f64> {
        let a = grid.node(cell);
        Ok(ppc as f64 * self.integral(a, a + grid.dx)? / grid.dx)
    }

    /// Upper bound on the number of particles `place` emits for the cell
    /// range `[range[0], range[1]]`.
    pub fn injection_estimate(&self, range: [usize; 2], grid: &Grid, ppc: usize) -> Result<usize> {
        let [i0, i1] = range;
        if i1 < i0 {
            return Ok(0);
        }
        let dx = grid.dx;
        let cells_from = |first: f64, last: usize| -> usize {
            let first = first.floor().max(i0 as f64);
            if first > last as f64 {
                0
            } else {
                (last - first as usize + 1) * ppc
            }
        };

        let np = match self {
            DensityProfile::Uniform { .. } => (i1 - i0 + 1) * ppc,
            DensityProfile::Step { start, .. } => cells_from(start / dx, i1),
            DensityProfile::Slab { start, end, .. } => {
                let last = (end / dx).floor();
                if last < i0 as f64 {
                    0
                } else {
                    cells_from(start / dx, i1.min(last as usize))
                }
            }
            DensityProfile::Ramp { .. } | DensityProfile::Custom { .. } => {
                let q = self.integral_over_cells(i0, i1 + 1, dx)?;
                (q * ppc as f64 / dx).ceil() as usize + 1
            }
        };
        Ok(np)
    }

    fn integral_over_cells(&self, first: usize, end: usize, dx: f64) -> Result<f64> {
        match self {
            DensityProfile::Custom { .. } => (first..end).try_fold(0.0, |acc, i| {
                Ok(acc + self.integral(i as f64 * dx, (i + 1) as f64 * dx)?)
            }),
            _ => self.integral(first as f64 * dx, end as f64 * dx),
        }
    }

    /// Places particles in the cell range `[range[0], range[1]]`, calling
    /// `emit(ix, x)` for each one.
    ///
    /// `injected` is the number of particles this profile already placed and
    /// `integral` the running density integral (in cells) of custom profiles;
    /// both let a later call continue where the previous one stopped.
    pub fn place<F>(
        &self,
        range: [usize; 2],
        grid: &Grid,
        ppc: usize,
        injected: u64,
        integral: &mut f64,
        mut emit: F,
    ) -> Result<()>
    where
        F: FnMut(usize, f64),
    {
        let [i0, i1] = range;
        let dx = grid.dx;
        let cpp = 1.0 / ppc as f64;

        match self {
            DensityProfile::Ramp {
                start, end, ramp, ..
            } => {
                let r1 = end / dx;
                let mut r0 = start / dx;
                if r1 <= r0 || (i0 as f64) > r1 || ((i1 + 1) as f64) < r0 {
                    return Ok(());
                }

                let (mut n0, n1) = (ramp[0], ramp[1]);
                if n0 == 0.0 && n1 == 0.0 {
                    return Ok(());
                }
                // Only the part of the ramp inside the box is injected
                if r0 < 0.0 {
                    n0 += -r0 * (n1 - n0) / (r1 - r0);
                    r0 = 0.0;
                }

                for k in injected.. {
                    // Cumulative density of particle k, normalized to the ramp length
                    let rs = (k as f64 + 0.5) * cpp / (r1 - r0);
                    let disc = n0 * n0 + 2.0 * (n1 - n0) * rs;
                    if disc < 0.0 {
                        break;
                    }
                    let u = 2.0 * rs / (disc.sqrt() + n0);
                    if !(u <= 1.0) {
                        break;
                    }

                    let pos = r0 + (r1 - r0) * u;
                    if pos < i0 as f64 {
                        continue;
                    }
                    let ix = pos.floor() as usize;
                    if ix > i1 || ix >= grid.nx {
                        break;
                    }
                    emit(ix, pos - ix as f64);
                }
            }

            DensityProfile::Custom { function, .. } => {
                let mut k = injected;
                let mut n1 = function.call(i0 as f64 * dx)?;
                let mut d1 = *integral;

                for ix in i0..=i1 {
                    let n0 = n1;
                    n1 = function.call((ix + 1) as f64 * dx)?;
                    let d0 = d1;
                    d1 += 0.5 * (n0 + n1);

                    loop {
                        let rs = (k as f64 + 0.5) * cpp;
                        if rs >= d1 {
                            break;
                        }
                        // Inverse of the linear density inside the cell; this
                        // form stays finite when n0 == n1
                        let disc = (n0 * n0 + 2.0 * (n1 - n0) * (rs - d0)).max(0.0);
                        let denom = disc.sqrt() + n0;
                        let pos = if denom > 0.0 {
                            2.0 * (rs - d0) / denom
                        } else {
                            0.0
                        };
                        emit(ix, pos.clamp(0.0, 1.0 - f64::EPSILON));
                        k += 1;
                    }
                }
                *integral = d1;
            }

            _ => {
                for ix in i0..=i1 {
                    for k in 0..ppc {
                        let x = (2 * k + 1) as f64 * 0.5 * cpp;
                        if self.shape((ix as f64 + x) * dx)? > 0.0 {
                            emit(ix, x);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
