//! Runs the dispersion scenario for every selected field solver.
//!
//! A thermal electron plasma seeds electromagnetic noise at all wavenumbers.
//! One field component is recorded at every iteration; the resulting
//! `iterations x cells` history, Fourier-transformed in space and time by the
//! analysis front end, traces the numerical dispersion relation of each
//! solver against \(\omega^2 = 1 + k^2\).
//!
//! Usage: `em1d [settings.toml]`. Without a settings file the built-in
//! scenario runs (500 cells, L = 50, dt = 0.05, 4000 iterations).

use log::{error, info};
use ndarray::Array2;
use rayon::prelude::*;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use em1d::config::Settings;
use em1d::error::Result;
use em1d::simulation::Simulation;
use em1d::solver::SolverKind;
use em1d::utils::*;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match env::args().nth(1) {
        Some(path) => match Settings::from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Unable to load settings from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };

    let solvers = settings.run.solvers.clone();
    let result: Result<Vec<()>> = solvers
        .into_par_iter()
        .map(|kind| run_solver(&settings, kind))
        .collect();

    if let Err(e) = result {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

/// Runs one independent simulation and writes its output under
/// `output_dir/<solver>/`.
fn run_solver(settings: &Settings, kind: SolverKind) -> Result<()> {
    let mut config = settings.simulation.clone();
    config.solver = kind;
    let run = &settings.run;

    let dir: PathBuf = run.output_dir.join(kind.name());
    fs::create_dir_all(&dir)?;
    write_params(&config, run, kind, &dir.join("params.txt"))?;

    let mut sim = Simulation::new(&config)?;
    write_coords(&sim.grid().coordinates(), &dir.join("x.csv"))?;

    let iterations = run.iterations as usize;
    let mut history = Array2::zeros((iterations, sim.grid().nx));
    let start = Instant::now();

    for n in 0..iterations {
        sim.iterate()?;
        history.row_mut(n).assign(sim.field(run.record));

        if (n + 1) % 500 == 0 {
            info!(
                "[{}] iteration {} / {}, t = {:.2}, field energy {:.4e}, kinetic energy {:.4e}",
                kind,
                n + 1,
                iterations,
                sim.time(),
                sim.field_energy(),
                sim.species_energy()
            );
        }
    }

    info!(
        "[{}] {} iterations in {:.2?}",
        kind,
        iterations,
        start.elapsed()
    );

    let path = dir.join(format!("{}.csv", run.record));
    write_real_2d(&history, &path)?;
    info!("[{}] wrote {}", kind, path.display());
    Ok(())
}
