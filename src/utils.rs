//! File output for recorded runs.
//!
//! Everything is written as plain comma-separated text so that the analysis
//! front end can load it without a parser for a binary format.

use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::{RunConfig, SimulationConfig};
use crate::solver::SolverKind;

/// Writes a 2D array of real numbers, one row per line.
///
/// Used for field histories, where row `n` is the field after iteration `n`.
///
/// # Arguments
///
/// * `array` - The values to write, one output line per row.
/// * `filename` - Path of the file to create.
///
/// # Returns
///
/// A `Result` indicating success or an I/O error.
pub fn write_real_2d(array: &Array2<f64>, filename: &Path) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    for row in array.rows() {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                write!(writer, ",")?;
            }
            write!(writer, "{}", value)?;
        }
        writeln!(writer)?;
    }

    writer.flush()
}

/// Writes grid coordinates on a single line.
///
/// # Arguments
///
/// * `data` - Node positions, as returned by `Grid::coordinates`.
/// * `filename` - Path of the file to create.
///
/// # Returns
///
/// A `Result` indicating success or an I/O error.
pub fn write_coords(data: &Array1<f64>, filename: &Path) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    for (i, &val) in data.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write!(writer, "{}", val)?;
    }
    writeln!(writer)?;

    writer.flush()
}

/// Writes the parameters of one run, one `key: value` per line.
///
/// # Arguments
///
/// * `simulation` - Grid, timestep and species of the run.
/// * `run` - Iteration count and recorded component.
/// * `solver` - The field solver this output belongs to.
/// * `filename` - Path of the file to create.
///
/// # Returns
///
/// A `Result` indicating success or an I/O error.
pub fn write_params(
    simulation: &SimulationConfig,
    run: &RunConfig,
    solver: SolverKind,
    filename: &Path,
) -> std::io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "solver: {}", solver)?;
    writeln!(writer, "cells: {}", simulation.cells)?;
    writeln!(writer, "box_length: {:.6e}", simulation.box_length)?;
    writeln!(
        writer,
        "dx: {:.6e}",
        simulation.box_length / simulation.cells as f64
    )?;
    writeln!(writer, "dt: {:.6e}", simulation.timestep)?;
    writeln!(writer, "seed: {}", simulation.seed)?;
    writeln!(writer, "iterations: {}", run.iterations)?;
    writeln!(writer, "recorded: {}", run.record)?;

    for species in &simulation.species {
        writeln!(writer, "species {} m_q: {:.6e}", species.name, species.mass_to_charge)?;
        writeln!(writer, "species {} ppc: {}", species.name, species.ppc)?;
        writeln!(writer, "species {} drift: {:?}", species.name, species.drift)?;
        writeln!(writer, "species {} thermal: {:?}", species.name, species.thermal)?;
        writeln!(
            writer,
            "species {} density: {:.6e}",
            species.name,
            species.density.reference_density()
        )?;
        writeln!(writer, "species {} boundary: {:?}", species.name, species.boundary)?;
    }

    writeln!(writer, "EOF")?;

    writer.flush()
}
