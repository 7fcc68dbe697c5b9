//! Reset replays the run that a fresh simulator with the same seed produces.

use sag_sim::{
    FeedVariability, Parameters, SimOptions, Simulator, StepReport, TargetKind, TargetsOnReset,
    VariabilityProfile,
};

fn noisy() -> Parameters {
    let mut variability = FeedVariability::default();
    variability.flow = VariabilityProfile {
        amplitude: 0.03,
        noise_std: 0.01,
        disturbance_probability: 0.02,
        disturbance_amplitude: 0.05,
        ..VariabilityProfile::flow_default()
    };
    Parameters {
        variability,
        ..Parameters::default()
    }
}

fn seeded(seed: u64) -> SimOptions {
    SimOptions {
        seed: Some(seed),
        ..SimOptions::default()
    }
}

fn run(sim: &mut Simulator, steps: usize) -> Vec<StepReport> {
    (0..steps).map(|_| sim.step()).collect()
}

#[test]
fn reset_replays_a_fresh_run() {
    let mut sim = Simulator::new(noisy(), seeded(42)).unwrap();
    let first = run(&mut sim, 400);
    let first_history = sim.history();

    sim.set_target(TargetKind::Flow, 2600.0).unwrap();
    sim.set_parameter_named("k_discharge", 1.4).unwrap();
    run(&mut sim, 50);

    sim.reset();
    assert_eq!(sim.step_count(), 0);
    assert_eq!(sim.snapshot().t_h, 0.0);
    assert!(sim.history().is_empty());
    assert_eq!(sim.parameters(), &noisy());

    let replay = run(&mut sim, 400);
    assert_eq!(first, replay);
    assert_eq!(first_history, sim.history());

    let mut fresh = Simulator::new(noisy(), seeded(42)).unwrap();
    assert_eq!(first, run(&mut fresh, 400));
}

#[test]
fn reset_twice_is_the_same_as_once() {
    let mut sim = Simulator::new(noisy(), seeded(8)).unwrap();
    run(&mut sim, 200);
    sim.reset();
    let once = run(&mut sim, 200);
    sim.reset();
    sim.reset();
    assert_eq!(once, run(&mut sim, 200));
}

#[test]
fn unseeded_simulator_still_replays_after_reset() {
    let mut sim = Simulator::new(noisy(), SimOptions::default()).unwrap();
    assert!(sim.seed().is_some());
    let first = run(&mut sim, 300);
    sim.reset();
    assert_eq!(first, run(&mut sim, 300));
}

#[test]
fn different_seeds_diverge_once_variability_starts() {
    let mut a = Simulator::new(noisy(), seeded(1)).unwrap();
    let mut b = Simulator::new(noisy(), seeded(2)).unwrap();
    let a = run(&mut a, 300);
    let b = run(&mut b, 300);
    // Identical through the warmup, different after it.
    assert_eq!(a[..120], b[..120]);
    assert_ne!(a[200..], b[200..]);
}

#[test]
fn reset_with_new_parameters_becomes_the_new_baseline() {
    let mut sim = Simulator::new(noisy(), seeded(5)).unwrap();
    run(&mut sim, 100);
    sim.set_target(TargetKind::Grade, 0.009).unwrap();

    let calmer = Parameters {
        variability: FeedVariability::disabled(),
        k_discharge_per_h: 0.7,
        ..Parameters::default()
    };
    sim.reset_with(calmer.clone(), TargetsOnReset::Preserve)
        .unwrap();
    assert_eq!(sim.targets().feed_grade, 0.009);
    let after = run(&mut sim, 100);

    sim.reset();
    assert_eq!(sim.parameters(), &calmer);
    assert_eq!(sim.targets(), sag_sim::Targets::nominal(&calmer));

    let mut fresh = Simulator::new(calmer, seeded(5)).unwrap();
    fresh.set_target(TargetKind::Grade, 0.009).unwrap();
    assert_eq!(after, run(&mut fresh, 100));
}

#[test]
fn rejected_reset_leaves_run_untouched() {
    let mut sim = Simulator::new(noisy(), seeded(5)).unwrap();
    run(&mut sim, 10);
    let bad = Parameters {
        k_discharge_per_h: 9.0,
        ..Parameters::default()
    };
    assert!(sim.reset_with(bad, TargetsOnReset::Nominal).is_err());
    assert_eq!(sim.step_count(), 10);
}
