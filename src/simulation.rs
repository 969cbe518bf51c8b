//! The simulation driver: one field solver, any number of species and the
//! per-iteration pipeline that couples them.
//!
//! Each iteration runs three stages in a fixed order:
//!
//! 1. **Deposit** – zero the shared accumulators and let every species add
//!    its charge and current.
//! 2. **Advance** – the field solver moves E and B one timestep with that
//!    current.
//! 3. **Push** – every species is pushed in the new fields.
//!
//! The stages are public so callers can inspect or perturb state between
//! them, but calling one out of order is an error.

use log::info;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;

use crate::config::{SimulationConfig, SpeciesConfig};
use crate::constants::SORT_INTERVAL;
use crate::current::Current;
use crate::error::{PicError, Result};
use crate::fields::EmFields;
use crate::solver::{build_solver, FieldSolver, SolverKind};
use crate::species::Species;
use crate::types::{FieldComponent, Grid};

/// Pipeline stages of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Deposit,
    Advance,
    Push,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Deposit => "deposit",
            Stage::Advance => "field advance",
            Stage::Push => "particle push",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct Simulation {
    grid: Grid,
    dt: f64,
    iteration: u64,
    solver: Box<dyn FieldSolver>,
    current: Current,
    species: Vec<Species>,
    next: Stage,
    rng: StdRng,
}

impl Simulation {
    /// Builds a simulation from its basic parameters, using the default seed.
    pub fn initialize(
        cells: usize,
        box_length: f64,
        timestep: f64,
        species: &[SpeciesConfig],
        solver: SolverKind,
    ) -> Result<Self> {
        Self::new(&SimulationConfig {
            cells,
            box_length,
            timestep,
            solver,
            species: species.to_vec(),
            ..SimulationConfig::default()
        })
    }

    /// Validates `config`, builds the grid and fields and injects every
    /// species.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let grid = Grid::new(config.cells, config.box_length)?;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let species = config
            .species
            .iter()
            .map(|s| Species::new(s, &grid, config.timestep, &mut rng))
            .collect::<Result<Vec<_>>>()?;

        let solver = build_solver(config.solver, &grid, EmFields::new(grid.nx));

        info!(
            "Simulation initialized: {} cells, L = {}, dx = {:.4}, dt = {}, solver {}",
            grid.nx, grid.box_length, grid.dx, config.timestep, config.solver
        );
        for s in &species {
            info!(
                "  species {}: m/q = {}, ppc = {}, {} particles, q = {:.4e}, {:?} boundary",
                s.name(),
                s.mass_to_charge(),
                s.ppc(),
                s.len(),
                s.q(),
                s.boundary()
            );
        }

        Ok(Simulation {
            grid,
            dt: config.timestep,
            iteration: 0,
            solver,
            current: Current::new(grid.nx),
            species,
            next: Stage::Deposit,
            rng,
        })
    }

    fn enter(&self, stage: Stage) -> Result<()> {
        if self.next == stage {
            Ok(())
        } else {
            Err(PicError::OutOfOrder {
                expected: self.next,
                called: stage,
            })
        }
    }

    /// Zeroes the shared accumulators and deposits every species.
    pub fn deposit(&mut self) -> Result<()> {
        self.enter(Stage::Deposit)?;
        self.current.zero();
        for species in &self.species {
            species.deposit(&mut self.current);
        }
        self.next = Stage::Advance;
        Ok(())
    }

    /// Advances the fields by one timestep with the deposited current.
    pub fn advance_fields(&mut self) -> Result<()> {
        self.enter(Stage::Advance)?;
        self.solver.advance(self.dt, &self.current);
        self.next = Stage::Push;
        Ok(())
    }

    /// Pushes every species and closes the iteration.
    pub fn push_particles(&mut self) -> Result<()> {
        self.enter(Stage::Push)?;
        let fields = self.solver.fields();
        for species in &mut self.species {
            species.advance(fields);
        }

        self.iteration += 1;
        if self.iteration % SORT_INTERVAL == 0 {
            for species in &mut self.species {
                species.sort();
            }
        }
        self.next = Stage::Deposit;
        Ok(())
    }

    pub fn iterate(&mut self) -> Result<()> {
        self.deposit()?;
        self.advance_fields()?;
        self.push_particles()
    }

    pub fn run(&mut self, iterations: u64) -> Result<()> {
        for _ in 0..iterations {
            self.iterate()?;
        }
        Ok(())
    }

    /// Replaces the field solver, carrying the current fields over.
    pub fn set_solver(&mut self, kind: SolverKind) {
        if kind == self.solver.kind() {
            return;
        }
        let fields = self.solver.fields().clone();
        info!(
            "Switching field solver {} -> {} at iteration {}",
            self.solver.kind(),
            kind,
            self.iteration
        );
        self.solver = build_solver(kind, &self.grid, fields);
    }

    /// Injects more particles into species `index` over the cell range
    /// `[range[0], range[1]]`.
    pub fn inject(&mut self, index: usize, range: [usize; 2]) -> Result<usize> {
        let species = self.species.get_mut(index).ok_or_else(|| {
            PicError::InvalidConfig(format!("no species with index {index}"))
        })?;
        species.inject(range, &mut self.rng)
    }

    pub fn solver_kind(&self) -> SolverKind {
        self.solver.kind()
    }

    /// The stage the next call must be.
    pub fn stage(&self) -> Stage {
        self.next
    }

    pub fn fields(&self) -> &EmFields {
        self.solver.fields()
    }

    pub fn field(&self, component: FieldComponent) -> &Array1<f64> {
        self.solver.fields().component(component)
    }

    /// Mutable access to one field component, e.g. to seed a perturbation.
    pub fn field_mut(&mut self, component: FieldComponent) -> &mut Array1<f64> {
        self.solver.fields_mut().component_mut(component)
    }

    /// Charge and current deposited at the last deposit stage.
    pub fn current(&self) -> &Current {
        &self.current
    }

    pub fn species(&self) -> &[Species] {
        &self.species
    }

    pub fn species_by_name(&self, name: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.name() == name)
    }

    /// Total kinetic energy of all species, from the last push.
    pub fn species_energy(&self) -> f64 {
        self.species.iter().map(Species::kinetic_energy).sum()
    }

    pub fn field_energy(&self) -> f64 {
        self.solver.fields().energy(self.grid.dx)
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn time(&self) -> f64 {
        self.iteration as f64 * self.dt
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}
