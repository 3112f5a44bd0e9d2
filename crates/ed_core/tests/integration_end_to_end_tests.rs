mod support;

use bevy_ecs::prelude::World;
use ed_core::diversion::DiversionPolicy;
use ed_core::ecs::ArrivalMode;
use ed_core::patterns::{RateInterval, RateSchedule};
use ed_core::pool::{Capacities, ResourcePools};
use ed_core::runner::{check_faults, initialize_simulation, run_simulation, run_until, snapshot};
use ed_core::scenario::{build_scenario, ScenarioParams};
use ed_core::telemetry::{EdTelemetry, Outcome};
use support::schedule::ScheduleRunner;

fn built_world(params: ScenarioParams) -> World {
    let mut world = World::new();
    build_scenario(&mut world, params).expect("scenario");
    initialize_simulation(&mut world);
    world
}

#[test]
fn pools_never_exceed_capacity_during_a_run() {
    let mut world = built_world(ScenarioParams::default().with_seed(7));
    let mut runner = ScheduleRunner::new();

    let mut steps = 0;
    while runner.run_one(&mut world) {
        steps += 1;
        check_faults(&world).expect("no invariant violations");
        for pool in world.resource::<ResourcePools>().iter() {
            assert!(
                pool.in_use() <= pool.capacity(),
                "{} over capacity at step {steps}",
                pool.kind().name()
            );
            let held: u32 = pool.holds().iter().map(|hold| hold.units).sum();
            assert_eq!(held, pool.in_use());
        }
    }
    assert!(steps > 100, "default scenario should be busy, ran {steps} steps");
}

#[test]
fn default_run_produces_consistent_records() {
    let result = run_simulation(ScenarioParams::default().with_seed(11)).expect("run");

    assert!(result.arrivals() > 0);
    assert_eq!(
        result.arrivals(),
        result.walk_in_arrivals + result.ambulance_arrivals
    );
    assert_eq!(
        result.in_system as u64 + result.records.len() as u64,
        result.arrivals()
    );
    // Samples every minute from 0 up to the horizon.
    assert_eq!(result.queue_samples.len(), 1000);

    for record in &result.records {
        assert!(record.arrived_at <= record.closed_at, "record {}", record.id);
        assert!(record.closed_at <= result.horizon);
        match record.outcome {
            Outcome::Discharged => {
                let bed_at = record.bed_at.expect("discharged patients had a bed");
                assert!(record.arrived_at <= bed_at && bed_at <= record.closed_at);
                // Shortest evaluation plus shortest rest.
                assert!(record.time_in_system() >= 7.0, "record {}", record.id);
            }
            Outcome::Diverted => {
                assert_eq!(record.arrival_mode, ArrivalMode::Ambulance);
                assert!(record.acuity > 2, "protected acuity diverted");
                assert_eq!(record.bed_at, None);
            }
            Outcome::Deceased => {
                assert!(record.bed_at.is_some());
            }
        }
    }

    for usage in &result.pool_usage {
        let capacity_minutes = usage.capacity as f64 * result.horizon;
        assert!(usage.busy_time <= capacity_minutes + 1e-6, "{:?}", usage.kind);
    }

    // Shortest evaluation (2) plus the shortest procedure (2) plus the shortest rest (5).
    let discharged: Vec<f64> = result
        .records_with(Outcome::Discharged)
        .map(|record| record.time_in_system())
        .collect();
    assert!(!discharged.is_empty());
    let mean = discharged.iter().sum::<f64>() / discharged.len() as f64;
    assert!(mean > 9.0, "mean time in system {mean}");
}

#[test]
fn same_seed_reproduces_the_run() {
    let params = ScenarioParams::default().with_seed(2024).with_horizon(600.0);
    let first = run_simulation(params.clone()).expect("first run");
    let second = run_simulation(params).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn different_seeds_diverge() {
    let first = run_simulation(ScenarioParams::default().with_seed(1)).expect("run");
    let second = run_simulation(ScenarioParams::default().with_seed(2)).expect("run");
    assert_ne!(first.records, second.records);
}

#[test]
fn small_department_diverts_ambulances() {
    let params = ScenarioParams::default()
        .with_seed(3)
        .with_capacities(Capacities {
            beds: 2,
            ..Default::default()
        });
    let result = run_simulation(params).expect("run");

    assert!(result.diversions > 0);
    assert_eq!(
        result.records_with(Outcome::Diverted).count() as u64,
        result.diversions
    );
    assert!(result
        .records_with(Outcome::Diverted)
        .all(|record| record.acuity > 2));
    let max_treatment_queue = result
        .queue_samples
        .iter()
        .map(|sample| sample.treatment_queue)
        .max()
        .unwrap_or(0);
    assert!(max_treatment_queue > 0, "two beds should back up");
}

#[test]
fn disabled_diversion_admits_everyone() {
    let params = ScenarioParams::default()
        .with_seed(3)
        .with_capacities(Capacities {
            beds: 2,
            ..Default::default()
        })
        .with_diversion_policy(DiversionPolicy {
            threshold: 1.0,
            protected_acuity: 5,
        });
    let result = run_simulation(params).expect("run");
    assert_eq!(result.diversions, 0);
}

#[test]
fn zero_rate_interval_pauses_arrivals_until_boundary() {
    let schedule = RateSchedule {
        intervals: vec![
            RateInterval::new(0, 7, 0.0, 0.0),
            RateInterval::new(7, 24, 6.0, 2.0),
        ],
    };
    let mut world = built_world(ScenarioParams::default().with_rate_schedule(schedule));
    let mut schedule = ed_core::runner::simulation_schedule();
    run_until(&mut world, &mut schedule, 1000.0).expect("run");

    let telemetry = world.resource::<EdTelemetry>();
    assert_eq!(telemetry.idle_intervals, 1);
    assert!(telemetry.arrivals() > 0);
    assert!(telemetry.records.iter().all(|record| record.arrived_at >= 420.0));

    let result = snapshot(&world);
    assert_eq!(result.horizon, 1000.0);
}

#[test]
fn quiet_day_has_no_arrivals() {
    let params = ScenarioParams::default().with_rate_schedule(RateSchedule::constant(0.0, 0.0));
    let result = run_simulation(params).expect("run");
    assert_eq!(result.arrivals(), 0);
    assert_eq!(result.in_system, 0);
    assert!(result
        .pool_usage
        .iter()
        .all(|usage| usage.busy_time == 0.0 && usage.grants == 0));
}
