//! Particle species: buffer management, injection, push and deposition.

use log::debug;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::config::SpeciesConfig;
use crate::constants::{CHUNK_SIZE, PARTICLE_BLOCK};
use crate::current::{deposit_charge, deposit_current, Current};
use crate::density::DensityProfile;
use crate::error::{PicError, Result};
use crate::fields::EmFields;
use crate::types::{Boundary, Grid, Particle, PhaseQuantity};

/// A population of macro-particles sharing charge, mass-to-charge ratio and
/// boundary behaviour.
#[derive(Debug, Clone)]
pub struct Species {
    name: String,
    m_q: f64,
    q: f64,
    ppc: usize,
    vfl: [f64; 3],
    vth: [f64; 3],
    density: DensityProfile,
    boundary: Boundary,
    grid: Grid,
    dt: f64,
    particles: Vec<Particle>,
    energy: f64,
    injected_particles: u64,
    injected_charge: f64,
    density_integral: f64,
}

impl Species {
    /// Creates the species and fills the whole box according to its density
    /// profile.
    pub fn new<R: Rng + ?Sized>(
        config: &SpeciesConfig,
        grid: &Grid,
        dt: f64,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let n = config.density.reference_density();

        let mut species = Species {
            name: config.name.clone(),
            m_q: config.mass_to_charge,
            q: config.mass_to_charge.signum() * n.abs() / config.ppc as f64,
            ppc: config.ppc,
            vfl: config.drift,
            vth: config.thermal,
            density: config.density.clone(),
            boundary: config.boundary,
            grid: *grid,
            dt,
            particles: Vec::new(),
            energy: 0.0,
            injected_particles: 0,
            injected_charge: 0.0,
            density_integral: 0.0,
        };
        species.inject([0, grid.nx - 1], rng)?;
        Ok(species)
    }

    /// Injects particles in the cell range `[range[0], range[1]]`, returning
    /// how many were created.
    ///
    /// Velocities are drawn as `drift + thermal * N(0, 1)` per component and
    /// taken as `v^{n-1/2}` directly, without a half-step back push. New
    /// particles deposit no longitudinal current until their first push.
    pub fn inject<R: Rng + ?Sized>(&mut self, range: [usize; 2], rng: &mut R) -> Result<usize> {
        let range = [range[0], range[1].min(self.grid.nx - 1)];
        if range[0] > range[1] {
            return Ok(0);
        }

        let estimate = self
            .density
            .injection_estimate(range, &self.grid, self.ppc)?;
        self.reserve(estimate)?;

        let start = self.particles.len();
        let (vfl, vth) = (self.vfl, self.vth);
        let particles = &mut self.particles;
        self.density.place(
            range,
            &self.grid,
            self.ppc,
            self.injected_particles,
            &mut self.density_integral,
            |ix, x| {
                let mut v = [0.0; 3];
                for d in 0..3 {
                    let z: f64 = rng.sample(StandardNormal);
                    v[d] = vfl[d] + vth[d] * z;
                }
                particles.push(Particle::new(ix, x, v));
            },
        )?;

        let created = self.particles.len() - start;
        self.injected_particles += created as u64;
        self.injected_charge += self.q * created as f64;
        debug!(
            "Species {}: injected {} particles in cells {}..={} (estimate {})",
            self.name, created, range[0], range[1], estimate
        );
        Ok(created)
    }

    /// Makes room for `additional` particles. Capacity grows in whole blocks,
    /// at least doubling, and never shrinks.
    fn reserve(&mut self, additional: usize) -> Result<()> {
        let len = self.particles.len();
        let needed = len + additional;
        let capacity = self.particles.capacity();
        if needed <= capacity {
            return Ok(());
        }

        let target = needed.max(2 * capacity).div_ceil(PARTICLE_BLOCK) * PARTICLE_BLOCK;
        self.particles
            .try_reserve_exact(target - len)
            .map_err(|_| PicError::Allocation {
                species: self.name.clone(),
                requested: target,
            })?;
        debug!(
            "Species {}: particle buffer grown to {} particles",
            self.name,
            self.particles.capacity()
        );
        Ok(())
    }

    /// Adds a single particle, e.g. to load a prepared distribution. It
    /// counts as not having moved yet.
    pub fn add_particle(&mut self, part: Particle) -> Result<()> {
        if part.ix >= self.grid.nx || !(0.0..1.0).contains(&part.x) {
            return Err(PicError::InvalidConfig(format!(
                "particle at cell {} offset {} is outside the box",
                part.ix, part.x
            )));
        }
        self.reserve(1)?;
        self.particles.push(Particle { dp: 0.0, ..part });
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mass_to_charge(&self) -> f64 {
        self.m_q
    }

    /// Charge of one macro-particle.
    pub fn q(&self) -> f64 {
        self.q
    }

    pub fn ppc(&self) -> usize {
        self.ppc
    }

    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    pub fn density(&self) -> &DensityProfile {
        &self.density
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Total charge currently in the box.
    pub fn charge(&self) -> f64 {
        self.q * self.particles.len() as f64
    }

    pub fn injected_particles(&self) -> u64 {
        self.injected_particles
    }

    pub fn injected_charge(&self) -> f64 {
        self.injected_charge
    }

    /// Kinetic energy computed during the last push.
    pub fn kinetic_energy(&self) -> f64 {
        self.energy
    }

    /// Deposits charge and current into `current`.
    ///
    /// Chunks deposit into private accumulators which are summed in chunk
    /// order, so the result does not depend on scheduling.
    pub fn deposit(&self, current: &mut Current) {
        let (q, dt, grid, boundary) = (self.q, self.dt, self.grid, self.boundary);
        let partials: Vec<Current> = self
            .particles
            .par_chunks(CHUNK_SIZE)
            .map(|chunk| {
                let mut partial = Current::new(grid.nx);
                deposit_charge(&mut partial.rho, chunk, q, &grid);
                deposit_current(&mut partial, chunk, q, &grid, dt, boundary);
                partial
            })
            .collect();

        for partial in &partials {
            current.add(partial);
        }
    }

    /// Charge density of this species alone.
    pub fn charge_density(&self) -> Array1<f64> {
        let mut rho = Array1::zeros(self.grid.nx);
        deposit_charge(&mut rho, &self.particles, self.q, &self.grid);
        rho
    }

    /// Advances every particle by one timestep in the given fields.
    pub fn advance(&mut self, fields: &EmFields) {
        let pusher = Pusher {
            tem: 0.5 * self.dt / self.m_q,
            dt_dx: self.dt / self.grid.dx,
            grid: self.grid,
            boundary: self.boundary,
        };

        let partials: Vec<f64> = self
            .particles
            .par_chunks_mut(CHUNK_SIZE)
            .map(|chunk| chunk.iter_mut().map(|p| pusher.push(p, fields)).sum::<f64>())
            .collect();
        let energy: f64 = partials.iter().sum();
        self.energy = 0.5 * self.q * self.m_q * energy * self.grid.dx;

        if self.boundary == Boundary::Open {
            let before = self.particles.len();
            let nx = self.grid.nx;
            self.particles.retain(|p| p.ix < nx);
            let lost = before - self.particles.len();
            if lost > 0 {
                debug!("Species {}: {} particles left the box", self.name, lost);
            }
        }
    }

    /// Sorts particles by cell index. The sort is stable.
    pub fn sort(&mut self) {
        self.particles.par_sort_by_key(|p| p.ix);
        debug!("Species {}: sorted {} particles", self.name, self.len());
    }

    /// Phase-space density of the two `axes`, binned on `bins` cells over
    /// `range`. Each particle adds its charge with bilinear weights; the
    /// result is indexed `[axis 1 bin, axis 0 bin]`.
    pub fn phase_space(
        &self,
        axes: [PhaseQuantity; 2],
        bins: [usize; 2],
        range: [[f64; 2]; 2],
    ) -> Result<Array2<f64>> {
        for (n, [lo, hi]) in bins.iter().zip(range.iter()) {
            if *n == 0 || !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(PicError::InvalidConfig(format!(
                    "phase space needs positive bins and an increasing range, got {n} over [{lo}, {hi}]"
                )));
            }
        }

        let mut buf = Array2::zeros((bins[1], bins[0]));
        let rdx = [
            bins[0] as f64 / (range[0][1] - range[0][0]),
            bins[1] as f64 / (range[1][1] - range[1][0]),
        ];
        let index = |i: i64, n: usize| usize::try_from(i).ok().filter(|&i| i < n);

        for part in &self.particles {
            let n1 = (axes[0].value(part, self.grid.dx) - range[0][0]) * rdx[0];
            let n2 = (axes[1].value(part, self.grid.dx) - range[1][0]) * rdx[1];
            let i1 = (n1 + 0.5).floor();
            let i2 = (n2 + 0.5).floor();
            let w1 = n1 - i1 + 0.5;
            let w2 = n2 - i2 + 0.5;
            let (i1, i2) = (i1 as i64, i2 as i64);

            for (dj, wy) in [(0, 1.0 - w2), (1, w2)] {
                let Some(row) = index(i2 + dj, bins[1]) else {
                    continue;
                };
                for (di, wx) in [(0, 1.0 - w1), (1, w1)] {
                    if let Some(col) = index(i1 + di, bins[0]) {
                        buf[[row, col]] += wx * wy * self.q;
                    }
                }
            }
        }
        Ok(buf)
    }
}

/// Per-push constants shared by all particles of a species.
#[derive(Debug, Clone, Copy)]
struct Pusher {
    tem: f64,
    dt_dx: f64,
    grid: Grid,
    boundary: Boundary,
}

#[inline(always)]
fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline(always)]
fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

impl Pusher {
    /// Boris push followed by the position update. Returns `v_old · v_new`.
    ///
    /// Particles leaving an open box are marked with `ix = nx`.
    #[inline]
    fn push(&self, part: &mut Particle, fields: &EmFields) -> f64 {
        let (e, b) = fields.interpolate(part, &self.grid);
        let e = e.map(|c| c * self.tem);
        let t = b.map(|c| c * self.tem);

        let v_old = part.v;
        let u = [v_old[0] + e[0], v_old[1] + e[1], v_old[2] + e[2]];

        let otsq = 2.0 / (1.0 + dot(t, t));
        let s = t.map(|c| c * otsq);
        let ut = cross(u, t);
        let u_prime = [u[0] + ut[0], u[1] + ut[1], u[2] + ut[2]];
        let us = cross(u_prime, s);
        let v_new = [
            u[0] + us[0] + e[0],
            u[1] + us[1] + e[1],
            u[2] + us[2] + e[2],
        ];
        part.v = v_new;
        part.dp = v_new[0] * self.dt_dx;

        let x = part.x + part.dp;
        let mut shift = x.floor();
        let mut x = x - shift;
        // A tiny negative offset can round up to exactly one
        if x >= 1.0 {
            x = 0.0;
            shift += 1.0;
        }
        let ix = part.ix as i64 + shift as i64;
        self.apply_boundary(part, ix, x);

        dot(v_old, v_new)
    }

    #[inline]
    fn apply_boundary(&self, part: &mut Particle, ix: i64, x: f64) {
        let nx = self.grid.nx as i64;
        if (0..nx).contains(&ix) {
            part.ix = ix as usize;
            part.x = x;
            return;
        }

        match self.boundary {
            Boundary::Periodic => {
                part.ix = ix.rem_euclid(nx) as usize;
                part.x = x;
            }
            Boundary::Open => {
                part.ix = self.grid.nx;
                part.x = x;
            }
            Boundary::Reflective => {
                let nxf = nx as f64;
                let p = ix as f64 + x;
                let p = if p < 0.0 { -p } else { 2.0 * nxf - p };
                let p = p.clamp(0.0, nxf * (1.0 - f64::EPSILON));
                let cell = (p.floor() as usize).min(self.grid.nx - 1);
                part.ix = cell;
                part.x = (p - cell as f64).min(1.0 - f64::EPSILON);
                part.v[0] = -part.v[0];
                part.dp = -part.dp;
            }
        }
    }
}
