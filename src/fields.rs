//! Electromagnetic field state on the staggered 1-D grid.

use ndarray::{Array1, Zip};

use crate::types::{FieldComponent, Grid, Particle};

/// Real-space E and B fields.
///
/// Layout follows the 1-D Yee cell: `ey`, `ez` and `bx` on nodes, `ex`, `by`
/// and `bz` on half nodes. Sample `i` of a half-node component sits at
/// `(i + 1/2) dx`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmFields {
    pub ex: Array1<f64>,
    pub ey: Array1<f64>,
    pub ez: Array1<f64>,
    pub bx: Array1<f64>,
    pub by: Array1<f64>,
    pub bz: Array1<f64>,
}

/// Linear weights of a particle on one of the two staggered grids.
#[derive(Debug, Clone, Copy)]
struct Weights {
    i0: usize,
    i1: usize,
    w: f64,
}

impl Weights {
    #[inline(always)]
    fn node(part: &Particle, grid: &Grid) -> Self {
        Weights {
            i0: part.ix,
            i1: grid.next(part.ix),
            w: part.x,
        }
    }

    #[inline(always)]
    fn half_node(part: &Particle, grid: &Grid) -> Self {
        let (i0, w) = if part.x >= 0.5 {
            (part.ix, part.x - 0.5)
        } else {
            (grid.prev(part.ix), part.x + 0.5)
        };
        Weights {
            i0,
            i1: grid.next(i0),
            w,
        }
    }

    #[inline(always)]
    fn sample(&self, f: &Array1<f64>) -> f64 {
        (1.0 - self.w) * f[self.i0] + self.w * f[self.i1]
    }
}

impl EmFields {
    pub fn new(nx: usize) -> Self {
        EmFields {
            ex: Array1::zeros(nx),
            ey: Array1::zeros(nx),
            ez: Array1::zeros(nx),
            bx: Array1::zeros(nx),
            by: Array1::zeros(nx),
            bz: Array1::zeros(nx),
        }
    }

    pub fn len(&self) -> usize {
        self.ex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ex.is_empty()
    }

    pub fn component(&self, component: FieldComponent) -> &Array1<f64> {
        match component {
            FieldComponent::Ex => &self.ex,
            FieldComponent::Ey => &self.ey,
            FieldComponent::Ez => &self.ez,
            FieldComponent::Bx => &self.bx,
            FieldComponent::By => &self.by,
            FieldComponent::Bz => &self.bz,
        }
    }

    pub fn component_mut(&mut self, component: FieldComponent) -> &mut Array1<f64> {
        match component {
            FieldComponent::Ex => &mut self.ex,
            FieldComponent::Ey => &mut self.ey,
            FieldComponent::Ez => &mut self.ez,
            FieldComponent::Bx => &mut self.bx,
            FieldComponent::By => &mut self.by,
            FieldComponent::Bz => &mut self.bz,
        }
    }

    /// Electromagnetic energy, \(\frac{1}{2}\sum (E^2 + B^2)\,\Delta x\).
    pub fn energy(&self, dx: f64) -> f64 {
        let sum_sq = |f: &Array1<f64>| f.iter().map(|v| v * v).sum::<f64>();
        0.5 * dx
            * FieldComponent::ALL
                .iter()
                .map(|&c| sum_sq(self.component(c)))
                .sum::<f64>()
    }

    /// Longitudinal Ampère law, \(\partial_t E_x = -j_x\). Identical for every
    /// solver in 1-D.
    pub fn advance_longitudinal(&mut self, dt: f64, jx: &Array1<f64>) {
        Zip::from(&mut self.ex)
            .and(jx)
            .for_each(|ex, &j| *ex -= dt * j);
    }

    /// E and B at the particle position, using the same linear shape as the
    /// deposition.
    #[inline]
    pub fn interpolate(&self, part: &Particle, grid: &Grid) -> ([f64; 3], [f64; 3]) {
        let node = Weights::node(part, grid);
        let half = Weights::half_node(part, grid);
        (
            [half.sample(&self.ex), node.sample(&self.ey), node.sample(&self.ez)],
            [node.sample(&self.bx), half.sample(&self.by), half.sample(&self.bz)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn interpolation_uses_staggered_positions() {
        let grid = Grid::new(4, 4.0).unwrap();
        let mut fields = EmFields::new(4);
        // A linear ramp sampled at each component's own positions
        for i in 0..4 {
            fields.ey[i] = i as f64;
            fields.ex[i] = i as f64 + 0.5;
        }
        let part = Particle::new(1, 0.75, [0.0; 3]);
        let (e, _) = fields.interpolate(&part, &grid);
        assert_approx_eq!(e[1], 1.75);
        assert_approx_eq!(e[0], 1.75);

        let part = Particle::new(2, 0.25, [0.0; 3]);
        let (e, _) = fields.interpolate(&part, &grid);
        assert_approx_eq!(e[0], 2.25);
    }

    #[test]
    fn energy_sums_all_components() {
        let mut fields = EmFields::new(2);
        fields.ey.fill(1.0);
        fields.bz.fill(2.0);
        assert_approx_eq!(fields.energy(0.5), 0.5 * 0.5 * (2.0 + 8.0));
    }
}
