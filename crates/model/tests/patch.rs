use approx::assert_relative_eq;
use canopy_core::{OdeState, OdeSystem};
use canopy_model::{
    CohortKind, Control, Error, LightState, Parameters, Patch, Spacing, SpeciesParameters,
    SurrogateParameters,
};
use canopy_solvers::ode;

// --- Test fixtures ---

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn patch_with(species: SpeciesParameters) -> Patch {
    init_logging();
    Patch::new(Parameters {
        species: vec![species],
        ..Parameters::default()
    })
    .expect("valid parameters")
}

/// One discrete species with `n` single-plant cohorts at seed size.
fn seedlings(n: usize) -> Patch {
    let mut patch = patch_with(SpeciesParameters::default());
    for _ in 0..n {
        patch.add_seeds(0, 1).expect("species 0 exists");
    }
    patch
}

fn with_surrogate(mass_leaf_max: f64) -> SpeciesParameters {
    SpeciesParameters {
        surrogate: Some(SurrogateParameters {
            n_plants: 40,
            mass_leaf_max,
            spacing: Spacing::Geometric,
        }),
        ..SpeciesParameters::default()
    }
}

// --- Tests ---

#[test]
fn seedlings_never_shrink() {
    let mut patch = seedlings(5);
    let before = patch.mass_leaf(0).expect("species 0 exists");
    assert_eq!(before.len(), 5);
    assert_eq!(patch.light_state(), LightState::Stale);
    assert_eq!(patch.light_environment_rebuilds(), 0);

    let step = patch.step_deterministic().expect("step succeeds");

    // One rebuild for the initial state, one per trial stage, and one for
    // the accepted state.
    let attempts = step.rejected + 1;
    assert_eq!(patch.light_state(), LightState::Fresh);
    assert_eq!(patch.light_environment_rebuilds(), 2 + 5 * attempts);

    assert!(step.time > 0.0);
    assert_relative_eq!(patch.time(), step.time);
    let after = patch.mass_leaf(0).expect("species 0 exists");
    for (old, new) in before.iter().zip(&after) {
        assert!(new >= old, "mass_leaf shrank from {old} to {new}");
    }
    assert!(after[0] > before[0]);
}

#[test]
fn stepping_reports_rates_of_the_accepted_state() {
    let mut patch = seedlings(3);
    patch.step_deterministic().expect("step succeeds");

    let reported: Vec<f64> = patch
        .cohorts(0)
        .expect("species 0 exists")
        .iter()
        .flat_map(|cohort| cohort.rates)
        .collect();
    let y = patch.ode_values_vec();
    let expected = patch.derivs_at(patch.time(), &y).expect("rates");

    assert_eq!(reported, expected);
    assert_eq!(patch.ode_rates_vec(), expected);
}

#[test]
fn failed_step_keeps_the_previous_state() {
    init_logging();
    let mut patch = Patch::new(Parameters {
        control: Control {
            ode_abs_tol: 1e-30,
            ode_rel_tol: 0.0,
            ode_step_size_initial: 1.0,
            ode_step_size_min: 0.5,
            ..Control::default()
        },
        species: vec![SpeciesParameters::default()],
        ..Parameters::default()
    })
    .expect("valid parameters");
    patch.add_seeds(0, 1).expect("species 0 exists");
    patch.add_seeds(0, 1).expect("species 0 exists");
    let before = patch.ode_values_vec();

    let err = patch.step_deterministic().expect_err("tolerance is unreachable");

    assert!(matches!(
        err,
        Error::Solver(ode::Error::StepSizeTooSmall { .. })
    ));
    assert_relative_eq!(patch.time(), 0.0);
    assert_eq!(patch.ode_values_vec(), before);
}

#[test]
fn light_is_rebuilt_once_per_new_state() {
    let mut patch = seedlings(5);
    assert_eq!(patch.light_state(), LightState::Stale);
    assert_eq!(patch.light_environment_rebuilds(), 0);

    let y = patch.ode_values_vec();
    let mut dydt = vec![0.0; y.len()];

    patch.derivs(0.0, &y, &mut dydt).expect("rates");
    assert_eq!(patch.light_state(), LightState::Fresh);
    assert_eq!(patch.light_environment_rebuilds(), 1);

    patch.derivs(0.0, &y, &mut dydt).expect("rates");
    assert_eq!(patch.light_environment_rebuilds(), 1);

    let mut grown = y.clone();
    grown[0] *= 1.5;
    patch.derivs(0.0, &grown, &mut dydt).expect("rates");
    assert_eq!(patch.light_environment_rebuilds(), 2);
    assert_eq!(patch.light_state(), LightState::Fresh);
}

#[test]
fn empty_patch_is_fully_open() {
    let mut patch = patch_with(SpeciesParameters::default());
    patch.compute_light_environment().expect("empty canopy");

    assert!(patch.light_environment().spline().is_none());
    for z in [0.0, 0.5, 10.0, 100.0] {
        assert_relative_eq!(patch.light_environment().openness(z), 1.0);
        assert_relative_eq!(patch.canopy_openness(z), 1.0);
    }
}

#[test]
fn adding_plants_never_opens_the_canopy() {
    let mut patch = seedlings(3);
    let heights: Vec<f64> = (0..=20)
        .map(|i| 0.4 * f64::from(i) / 20.0)
        .collect();
    let before: Vec<f64> = heights.iter().map(|&z| patch.canopy_openness(z)).collect();

    patch.add_seeds(0, 4).expect("species 0 exists");
    let taller = 4.0 * patch.mass_leaf(0).expect("species 0 exists")[0];
    let mut sizes = patch.mass_leaf(0).expect("species 0 exists");
    sizes[3] = taller;
    patch.set_mass_leaf(&sizes, 0).expect("one size per unit");

    for (&z, &open) in heights.iter().zip(&before) {
        let now = patch.canopy_openness(z);
        assert!(now <= open, "openness at {z} rose from {open} to {now}");
        assert!(now <= 1.0);
    }
    assert!(patch.canopy_openness(0.0) < before[0]);
}

#[test]
fn fitted_light_tracks_canopy_openness() {
    let mut patch = seedlings(5);
    patch.compute_vars_phys().expect("rates");

    let height = patch.height_max();
    let light = patch.light_environment();
    for i in 0..=10 {
        let z = height * f64::from(i) / 10.0;
        assert_relative_eq!(light.openness(z), patch.canopy_openness(z), epsilon = 1e-5);
    }
    assert_relative_eq!(light.openness(2.0 * height), 1.0, epsilon = 1e-12);
}

#[test]
fn state_round_trips_and_derivs_at_is_pure() {
    let mut patch = seedlings(4);
    let y = patch.ode_values_vec();
    assert_eq!(y.len(), patch.ode_size());
    assert_eq!(y.len(), 4 * 3);

    let mut shifted = y.clone();
    shifted[3] *= 2.0;
    shifted[4] = 0.1;

    let dydt = patch.derivs_at(0.0, &shifted).expect("rates");
    assert_eq!(dydt.len(), y.len());
    assert_eq!(patch.ode_values_vec(), y);
    assert_eq!(patch.light_environment_rebuilds(), 0);

    assert!(patch.ode_values_set(&shifted));
    assert_eq!(patch.ode_values_vec(), shifted);
    assert!(!patch.ode_values_set(&shifted));

    let err = patch.derivs_at(0.0, &y[..5]).expect_err("short state");
    assert!(matches!(err, Error::LengthMismatch { expected: 12, got: 5 }));
}

#[test]
fn surrogate_rates_match_direct_rates() {
    let mut direct = seedlings(3);
    let mut surrogate = patch_with(with_surrogate(5e-4));
    for _ in 0..3 {
        surrogate.add_seeds(0, 1).expect("species 0 exists");
    }

    let seed = direct.mass_leaf(0).expect("species 0 exists")[0];
    let sizes = [seed, 3.0 * seed, 7.0 * seed];
    direct.set_mass_leaf(&sizes, 0).expect("three units");
    surrogate.set_mass_leaf(&sizes, 0).expect("three units");

    let y = direct.ode_values_vec();
    let exact = direct.derivs_at(0.0, &y).expect("direct rates");
    let approx = surrogate.derivs_at(0.0, &y).expect("surrogate rates");

    // Growth and mortality; fecundity of seedlings is vanishingly small.
    for unit in 0..3 {
        for channel in 0..2 {
            let i = 3 * unit + channel;
            assert_relative_eq!(approx[i], exact[i], max_relative = 1e-3);
        }
    }
    assert_relative_eq!(approx[0], exact[0], max_relative = 1e-9);
}

#[test]
fn outgrown_surrogate_is_rebuilt() {
    let mut patch = patch_with(with_surrogate(5e-4));
    patch.add_seeds(0, 1).expect("species 0 exists");
    patch.set_mass_leaf(&[1e-3], 0).expect("one unit");

    patch.compute_vars_phys().expect("surrogate is rebuilt");

    let species = patch.species(0).expect("species 0 exists");
    let surrogate = species.surrogate().expect("configured with a surrogate");
    assert_relative_eq!(surrogate.mass_leaf_max(), 2e-3);
    assert_eq!(surrogate.n_plants(), 40);
}

#[test]
fn continuous_cohorts_thin_over_time() {
    let mut patch = patch_with(SpeciesParameters {
        cohort: CohortKind::Continuous,
        ..SpeciesParameters::default()
    });
    patch.add_seeds(0, 10).expect("species 0 exists");

    let solution = patch.advance(0.5).expect("advance");

    assert_relative_eq!(solution.time, 0.5);
    assert_relative_eq!(patch.time(), 0.5);
    let cohorts = patch.cohorts(0).expect("species 0 exists");
    assert_eq!(cohorts.len(), 1);
    let cohort = cohorts[0];
    assert_eq!(cohort.kind, CohortKind::Continuous);
    assert!(cohort.mortality > 0.0);
    assert!(cohort.weight < 10.0);
    assert!(cohort.height > 0.33);
}

#[test]
fn patch_from_toml() {
    init_logging();
    let parameters = Parameters::from_toml_str(
        r#"
        c_ext = 0.6

        [[species]]
        cohort = "discrete"

        [[species]]
        cohort = "continuous"

        [species.surrogate]
        n_plants = 8
        mass_leaf_max = 0.001
        spacing = "geometric"
        "#,
    )
    .expect("valid parameters");

    let mut patch = Patch::new(parameters).expect("valid patch");
    patch.add_seeds(0, 2).expect("species 0 exists");
    patch.add_seeds(1, 2).expect("species 1 exists");

    assert_eq!(patch.len(), 2);
    assert_relative_eq!(patch.c_ext(), 0.6);
    assert!(patch.species(0).expect("species 0").surrogate().is_none());
    assert!(patch.species(1).expect("species 1").surrogate().is_some());
    assert!(matches!(
        patch.mass_leaf(2),
        Err(Error::NoSuchSpecies { idx: 2, len: 2 })
    ));

    patch.step_deterministic().expect("step succeeds");
    assert!(patch.time() > 0.0);
}
