use assert_approx_eq::assert_approx_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use em1d::{
    Boundary, DensityProfile, FieldComponent, Grid, PicError, Settings, Simulation, SolverKind,
    Species, SpeciesConfig,
};

fn ramp_species(grid: &Grid, ppc: usize) -> Species {
    let config = SpeciesConfig {
        density: DensityProfile::Ramp {
            n: 1.0,
            start: 0.0,
            end: grid.box_length,
            ramp: [0.5, 2.0],
        },
        ..SpeciesConfig::new("electrons", -1.0, ppc)
    };
    let mut rng = StdRng::seed_from_u64(5);
    Species::new(&config, grid, 0.1, &mut rng).unwrap()
}

#[test]
fn ramp_expected_count_is_monotone_and_matches_endpoints() {
    let grid = Grid::new(100, 20.0).unwrap();
    let ppc = 32;
    let species = ramp_species(&grid, ppc);
    let profile = species.density();

    let expected: Vec<f64> = (0..grid.nx)
        .map(|i| profile.expected_particles(i, &grid, ppc).unwrap())
        .collect();
    assert!(expected.windows(2).all(|w| w[1] > w[0]));

    let half_cell = 0.5 * grid.dx / grid.box_length * 1.5;
    assert_approx_eq!(expected[0], ppc as f64 * (0.5 + half_cell), 1e-9);
    assert_approx_eq!(expected[grid.nx - 1], ppc as f64 * (2.0 - half_cell), 1e-9);

    let mut counts = vec![0usize; grid.nx];
    for p in species.particles() {
        counts[p.ix] += 1;
    }
    for (count, exp) in counts.iter().zip(expected.iter()) {
        assert!((*count as f64 - exp).abs() <= 1.0, "{count} vs {exp}");
    }
}

#[test]
fn ramp_injection_does_not_repeat_placed_particles() {
    let grid = Grid::new(40, 8.0).unwrap();
    let mut species = ramp_species(&grid, 10);
    let placed = species.len();
    assert_eq!(species.injected_particles(), placed as u64);
    assert_approx_eq!(species.injected_charge(), species.charge(), 1e-12);

    // The counter continues past the end of the ramp, so nothing is added
    let mut rng = StdRng::seed_from_u64(6);
    assert_eq!(species.inject([0, 39], &mut rng).unwrap(), 0);
    assert_eq!(species.len(), placed);
    assert_eq!(species.inject([5, 2], &mut rng).unwrap(), 0);
    assert_eq!(species.injected_particles(), placed as u64);
}

#[test]
fn custom_density_with_negative_values_is_fatal() {
    let grid = Grid::new(10, 10.0).unwrap();
    let config = SpeciesConfig {
        density: DensityProfile::custom(1.0, |x| 5.0 - x),
        ..SpeciesConfig::new("electrons", -1.0, 4)
    };
    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
        Species::new(&config, &grid, 0.1, &mut rng),
        Err(PicError::InvalidDensity { .. })
    ));
}

#[test]
fn custom_density_injection_tracks_counters() {
    let grid = Grid::new(50, 10.0).unwrap();
    let config = SpeciesConfig {
        density: DensityProfile::custom(2.0, |x| 1.0 + (0.5 * x).sin().abs()),
        ..SpeciesConfig::new("ions", 1836.0, 20)
    };
    let mut rng = StdRng::seed_from_u64(9);
    let species = Species::new(&config, &grid, 0.1, &mut rng).unwrap();

    assert_approx_eq!(species.q(), 0.1);
    assert_eq!(species.injected_particles(), species.len() as u64);
    assert_approx_eq!(species.injected_charge(), species.charge(), 1e-9);
    let expected: f64 = (0..grid.nx)
        .map(|i| species.density().expected_particles(i, &grid, 20).unwrap())
        .sum();
    assert!((species.len() as f64 - expected).abs() <= 1.0);
}

#[test]
fn settings_parse_from_toml() {
    let settings = Settings::from_toml_str(
        r#"
        [simulation]
        cells = 128
        box_length = 12.8
        timestep = 0.05
        solver = "pstd"
        seed = 42

        [[simulation.species]]
        name = "electrons"
        mass_to_charge = -1.0
        ppc = 16
        thermal = [0.01, 0.01, 0.01]
        density = { kind = "slab", n = 2.0, start = 2.0, end = 10.0 }
        boundary = "reflective"

        [[simulation.species]]
        name = "positrons"
        mass_to_charge = 1.0
        ppc = 16
        density = { kind = "ramp", start = 0.0, end = 12.8, ramp = [0.0, 1.0] }

        [run]
        iterations = 10
        record = "bz"
        solvers = ["psatd"]
        "#,
    )
    .unwrap();

    let sim = &settings.simulation;
    assert_eq!(sim.cells, 128);
    assert_eq!(sim.solver, SolverKind::Pstd);
    assert_eq!(sim.seed, 42);
    assert_eq!(sim.species.len(), 2);
    assert_eq!(sim.species[0].boundary, Boundary::Reflective);
    assert_eq!(sim.species[1].boundary, Boundary::Periodic);
    assert_eq!(sim.species[1].density.reference_density(), 1.0);
    assert_eq!(settings.run.record, FieldComponent::Bz);
    assert_eq!(settings.run.solvers, vec![SolverKind::Psatd]);

    let mut simulation = Simulation::new(sim).unwrap();
    simulation.run(settings.run.iterations).unwrap();
    assert_eq!(simulation.iteration(), 10);
}

#[test]
fn bad_settings_are_rejected() {
    let unknown_solver = r#"
        [simulation]
        cells = 16
        box_length = 1.0
        timestep = 0.01
        solver = "yee"
    "#;
    assert!(matches!(
        Settings::from_toml_str(unknown_solver),
        Err(PicError::Toml(_))
    ));

    let unknown_field = r#"
        [simulation]
        cells = 16
        box_length = 1.0
        timestep = 0.01
        solver = "fdtd"
        courant = 0.5
    "#;
    assert!(Settings::from_toml_str(unknown_field).is_err());

    let zero_cells = r#"
        [simulation]
        cells = 0
        box_length = 1.0
        timestep = 0.01
        solver = "fdtd"
    "#;
    assert!(matches!(
        Settings::from_toml_str(zero_cells),
        Err(PicError::InvalidConfig(_))
    ));

    assert!(matches!(
        Simulation::initialize(16, -1.0, 0.1, &[], SolverKind::Fdtd),
        Err(PicError::InvalidConfig(_))
    ));
}
