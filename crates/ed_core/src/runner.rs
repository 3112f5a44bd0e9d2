//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step pops the
//! next event from [SimulationClock], inserts it as [CurrentEvent], then runs the
//! schedule. Faults recorded by systems abort the run after the offending step.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::error::{SimError, SimFaults};
use crate::pool::ResourcePools;
use crate::scenario::{build_scenario, ScenarioParams, SimulationEndTime};
use crate::systems::{
    ambulance::{
        ambulance_assigned_system, ambulance_dispatch_system, ambulance_on_scene_system,
        ambulance_returned_system, diversion_travel_complete_system,
    },
    arrival::{patient_arrival_system, simulation_started_system},
    discharge::{bed_cleaned_system, discharge_start_system, patient_deceased_system},
    queue_sample::queue_sample_system,
    treatment::{
        bed_acquired_system, evaluation_complete_system, procedure_complete_system,
        procedure_next_system, procedure_resource_acquired_system, rest_complete_system,
        treatment_start_system,
    },
    triage::{triage_complete_system, triage_staff_acquired_system, triage_start_system},
};
use crate::telemetry::{EdTelemetry, RunInfo, RunResult};

/// Run condition: the current event is of `kind`.
pub fn on_event(kind: EventKind) -> impl FnMut(Option<Res<CurrentEvent>>) -> bool + Clone {
    move |event: Option<Res<CurrentEvent>>| event.map(|e| e.0.kind == kind).unwrap_or(false)
}

/// Runs one simulation step: pops the next event, inserts it as [CurrentEvent], then runs
/// the schedule. Returns `false` if the clock was empty or the next event is at or past
/// [SimulationEndTime] (when that resource is present).
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let stop_at = world.get_resource::<SimulationEndTime>().map(|end| end.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|clock| clock.next_event_time());
    if let (Some(end), Some(ts)) = (stop_at, next_ts) {
        if ts >= end {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(event) => event,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    true
}

/// Runs simulation steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// First invariant violation recorded so far, as an error.
pub fn check_faults(world: &World) -> Result<(), SimError> {
    match world
        .get_resource::<SimFaults>()
        .and_then(|faults| faults.first().cloned())
    {
        Some((at, violation)) => Err(SimError::Invariant { at, violation }),
        None => Ok(()),
    }
}

/// Process every event due strictly before `horizon`, then move the clock to `horizon`.
pub fn run_until(
    world: &mut World,
    schedule: &mut Schedule,
    horizon: f64,
) -> Result<usize, SimError> {
    world.insert_resource(SimulationEndTime(horizon));
    let mut steps = 0;
    while run_next_event(world, schedule) {
        steps += 1;
        if let Err(err) = check_faults(world) {
            tracing::error!(steps, error = %err, "run aborted");
            return Err(err);
        }
    }
    world.resource_mut::<SimulationClock>().advance_to(horizon);
    Ok(steps)
}

/// Builds the simulation schedule: one system per event kind, gated on the current event,
/// plus [apply_deferred] so spawned patients exist before the next step.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        (
            simulation_started_system.run_if(on_event(EventKind::SimulationStarted)),
            patient_arrival_system.run_if(on_event(EventKind::PatientArrival)),
            queue_sample_system.run_if(on_event(EventKind::QueueSample)),
        ),
        (
            ambulance_dispatch_system.run_if(on_event(EventKind::AmbulanceDispatch)),
            ambulance_assigned_system.run_if(on_event(EventKind::AmbulanceAssigned)),
            ambulance_on_scene_system.run_if(on_event(EventKind::AmbulanceOnScene)),
            ambulance_returned_system.run_if(on_event(EventKind::AmbulanceReturned)),
            diversion_travel_complete_system
                .run_if(on_event(EventKind::DiversionTravelComplete)),
        ),
        (
            triage_start_system.run_if(on_event(EventKind::TriageStart)),
            triage_staff_acquired_system.run_if(on_event(EventKind::TriageStaffAcquired)),
            triage_complete_system.run_if(on_event(EventKind::TriageComplete)),
        ),
        (
            treatment_start_system.run_if(on_event(EventKind::TreatmentStart)),
            bed_acquired_system.run_if(on_event(EventKind::BedAcquired)),
            evaluation_complete_system.run_if(on_event(EventKind::EvaluationComplete)),
            procedure_next_system.run_if(on_event(EventKind::ProcedureNext)),
            procedure_resource_acquired_system
                .run_if(on_event(EventKind::ProcedureResourceAcquired)),
            procedure_complete_system.run_if(on_event(EventKind::ProcedureComplete)),
            rest_complete_system.run_if(on_event(EventKind::RestComplete)),
        ),
        (
            discharge_start_system.run_if(on_event(EventKind::DischargeStart)),
            bed_cleaned_system.run_if(on_event(EventKind::BedCleaned)),
            patient_deceased_system.run_if(on_event(EventKind::PatientDeceased)),
        ),
        apply_deferred,
    ));
    schedule
}

/// Schedules the SimulationStarted event at time 0.
/// Call this after building the scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(0.0, EventKind::SimulationStarted, None);
}

/// Snapshot of a built world, normally taken once the run reached its horizon. Holds
/// still open are credited up to the horizon.
pub fn snapshot(world: &World) -> RunResult {
    let info = world.resource::<RunInfo>();
    let telemetry = world.resource::<EdTelemetry>();
    let pools = world.resource::<ResourcePools>();
    let arrivals = telemetry.arrivals();
    RunResult {
        seed: info.seed,
        horizon: info.horizon,
        capacities: info.capacities,
        walk_in_arrivals: telemetry.walk_in_arrivals,
        ambulance_arrivals: telemetry.ambulance_arrivals,
        diversions: telemetry.diversions,
        queue_samples: telemetry.queue_samples.clone(),
        records: telemetry.records.clone(),
        pool_usage: pools.usage_at(info.horizon),
        in_system: arrivals.saturating_sub(telemetry.records.len() as u64) as usize,
    }
}

/// Build, run and snapshot one replication.
pub fn run_simulation(params: ScenarioParams) -> Result<RunResult, SimError> {
    let horizon = params.horizon;
    let seed = params.seed;
    let mut world = World::new();
    build_scenario(&mut world, params)?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    tracing::info!(seed, horizon, "run started");
    let steps = run_until(&mut world, &mut schedule, horizon)?;
    let result = snapshot(&world);
    tracing::info!(
        seed,
        steps,
        arrivals = result.arrivals(),
        diversions = result.diversions,
        closed = result.records.len(),
        "run finished"
    );
    Ok(result)
}
