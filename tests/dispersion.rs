use assert_approx_eq::assert_approx_eq;
use num_complex::Complex;
use std::f64::consts::PI;

use em1d::fft::FftEngine;
use em1d::{FieldComponent, Settings, Simulation, SolverKind, SpeciesConfig};

/// Amplitude of the `cos(k x)` component of `ey`.
fn cos_amplitude(sim: &Simulation, k: f64) -> f64 {
    let grid = sim.grid();
    let ey = sim.field(FieldComponent::Ey);
    2.0 / grid.nx as f64
        * (0..grid.nx)
            .map(|i| ey[i] * (k * grid.node(i)).cos())
            .sum::<f64>()
}

fn seed_mode(sim: &mut Simulation, k: f64, amplitude: f64) {
    let coords = sim.grid().coordinates();
    let ey = sim.field_mut(FieldComponent::Ey);
    for (e, x) in ey.iter_mut().zip(coords.iter()) {
        *e = amplitude * (k * x).cos();
    }
}

/// Phase advance per step of a vacuum mode for each solver.
fn numerical_phase(kind: SolverKind, k: f64, dx: f64, dt: f64) -> f64 {
    match kind {
        SolverKind::Fdtd => {
            let kk = 2.0 * (0.5 * k * dx).sin() / dx;
            (1.0 - 0.5 * (kk * dt).powi(2)).acos()
        }
        SolverKind::Pstd => (1.0 - 0.5 * (k * dt).powi(2)).acos(),
        SolverKind::Psatd => k * dt,
    }
}

#[test]
fn vacuum_modes_follow_each_solver_dispersion() {
    let (cells, length, dt) = (64, 64.0, 0.5);
    let dx = length / cells as f64;
    let k = 2.0 * PI * 24.0 / length;

    let mut errors = Vec::new();
    for kind in SolverKind::ALL {
        let mut sim = Simulation::initialize(cells, length, dt, &[], kind).unwrap();
        seed_mode(&mut sim, k, 1.0);
        let theta = numerical_phase(kind, k, dx, dt);

        for n in 1..=40 {
            sim.iterate().unwrap();
            assert_approx_eq!(cos_amplitude(&sim, k), (theta * n as f64).cos(), 1e-9);
        }
        errors.push((theta / dt - k).abs());
    }

    // FDTD lags the most near Nyquist, PSATD has no dispersion error at all
    assert!(errors[0] > errors[1]);
    assert!(errors[1] > errors[2]);
    assert!(errors[2] < 1e-12);
}

/// Angular frequency from the zero crossings of a sampled signal.
fn crossing_frequency(signal: &[f64], dt: f64) -> f64 {
    let crossings: Vec<f64> = signal
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] * w[1] < 0.0)
        .map(|(n, w)| (n as f64 + w[0] / (w[0] - w[1])) * dt)
        .collect();
    assert!(crossings.len() >= 4, "too few zero crossings");
    let span = crossings[crossings.len() - 1] - crossings[0];
    PI * (crossings.len() - 1) as f64 / span
}

#[test]
fn cold_plasma_wave_follows_plasma_dispersion() {
    let cells = 256;
    let length = 8.0 * PI;
    let dt = 0.05;
    let k = 2.0 * PI * 4.0 / length;
    let expected = (1.0 + k * k).sqrt();

    for kind in SolverKind::ALL {
        let electrons = SpeciesConfig::new("electrons", -1.0, 16);
        let mut sim = Simulation::initialize(cells, length, dt, &[electrons], kind).unwrap();
        seed_mode(&mut sim, k, 1e-4);

        let mut signal = Vec::with_capacity(900);
        for _ in 0..900 {
            sim.iterate().unwrap();
            signal.push(cos_amplitude(&sim, k));
        }

        let omega = crossing_frequency(&signal, dt);
        assert!(
            (omega - expected).abs() < 0.01 * expected,
            "{kind}: measured {omega}, expected {expected}"
        );
    }
}

/// Frequency with the most power in the history of spatial mode `m`.
fn peak_frequency(history: &[Vec<f64>], m: usize, length: f64, dt: f64) -> f64 {
    let k = 2.0 * PI * m as f64 / length;
    let steps = history.len();
    let mut series: Vec<Complex<f64>> = history
        .iter()
        .enumerate()
        .map(|(n, ey)| {
            let dx = length / ey.len() as f64;
            let mode: Complex<f64> = ey
                .iter()
                .enumerate()
                .map(|(i, &e)| e * Complex::from_polar(1.0, -k * i as f64 * dx))
                .sum();
            // Hann window
            let w = 0.5 - 0.5 * (2.0 * PI * n as f64 / steps as f64).cos();
            mode * w
        })
        .collect();

    FftEngine::new(steps).forward(&mut series);
    let (peak, _) = series
        .iter()
        .enumerate()
        .skip(1)
        .fold((0, 0.0), |best, (j, c)| {
            if c.norm() > best.1 {
                (j, c.norm())
            } else {
                best
            }
        });
    let j = if peak <= steps / 2 {
        peak as f64
    } else {
        steps as f64 - peak as f64
    };
    2.0 * PI * j / (steps as f64 * dt)
}

#[test]
#[ignore = "long run of the full dispersion scenario"]
fn default_scenario_concentrates_on_the_plasma_branch() {
    let settings = Settings::default();
    let config = &settings.simulation;
    let mut sim = Simulation::new(config).unwrap();
    let charge = sim.species()[0].charge();

    let mut history = Vec::with_capacity(settings.run.iterations as usize);
    for _ in 0..settings.run.iterations {
        sim.iterate().unwrap();
        history.push(sim.field(settings.run.record).to_vec());
    }

    assert_eq!(sim.iteration(), 4000);
    assert_approx_eq!(sim.time(), 200.0, 1e-9);
    assert_approx_eq!(sim.species()[0].charge(), charge);
    assert!(sim.field_energy().is_finite());

    let resolution = 2.0 * PI / sim.time();
    for m in [5, 10, 20, 40] {
        let k = 2.0 * PI * m as f64 / config.box_length;
        let expected = (1.0 + k * k).sqrt();
        let omega = peak_frequency(&history, m, config.box_length, config.timestep);
        assert!(
            (omega - expected).abs() < 3.0 * resolution,
            "mode {m}: peak at {omega}, expected {expected}"
        );
    }
}
