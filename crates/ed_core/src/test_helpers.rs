//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across test files.

use bevy_ecs::prelude::{Entity, IntoSystemConfigs, Schedule, World};

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::ecs::{Acuity, ArrivalMode, Patient};
use crate::pool::Capacities;
use crate::scenario::{build_scenario, ScenarioParams};

/// Seed used by tests that do not care about the exact draws.
pub const TEST_SEED: u64 = 42;

/// Acuity level as a value.
///
/// # Panics
///
/// Panics if `level` is outside 1..=5.
pub fn acuity(level: u8) -> Acuity {
    Acuity::new(level).expect("acuity level should be in 1..=5")
}

/// Create a world with every run resource for `params`.
///
/// # Panics
///
/// Panics if `params` does not validate.
pub fn create_test_world_with(params: ScenarioParams) -> World {
    let mut world = World::new();
    build_scenario(&mut world, params).expect("test scenario should be valid");
    world
}

/// Create a world with the default scenario and [TEST_SEED].
pub fn create_test_world() -> World {
    create_test_world_with(ScenarioParams::default().with_seed(TEST_SEED))
}

/// Small department: one unit of everything.
pub fn single_unit_capacities() -> Capacities {
    Capacities {
        beds: 1,
        nurses: 1,
        doctors: 1,
        ambulances: 1,
        xray_machines: 1,
        ct_scanners: 1,
        oxygen_supplies: 1,
    }
}

/// Spawn a patient without scheduling any of its journey.
pub fn spawn_patient(world: &mut World, id: u64, level: u8, mode: ArrivalMode) -> Entity {
    let now = world.resource::<SimulationClock>().now();
    world.spawn(Patient::new(id, acuity(level), mode, now)).id()
}

/// Resume `patient` at `kind` after `delay` minutes.
pub fn resume(world: &mut World, patient: Entity, kind: EventKind, delay: f64) {
    world
        .resource_mut::<SimulationClock>()
        .resume_patient(delay, kind, patient);
}

/// Pop the next event, make it current and run `systems` once against it.
///
/// # Panics
///
/// Panics if no event is scheduled.
pub fn step_event<M>(world: &mut World, systems: impl IntoSystemConfigs<M>) -> Event {
    let event = world
        .resource_mut::<SimulationClock>()
        .pop_next()
        .expect("an event should be scheduled");
    world.insert_resource(CurrentEvent(event));
    let mut schedule = Schedule::default();
    schedule.add_systems(systems);
    schedule.run(world);
    event
}
