//! Ambulance journey: crew dispatch, on-scene diversion decision and return.

use bevy_ecs::prelude::{Commands, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::distributions::SimRng;
use crate::diversion::{DiversionDecision, DiversionPolicy};
use crate::ecs::{AmbulanceRun, Patient, PatientStage};
use crate::error::SimFaults;
use crate::pool::{PoolKind, ResourcePools};
use crate::scenario::AmbulanceConfig;
use crate::systems::{record_missing_patient, resumed_patient};
use crate::telemetry::{EdTelemetry, Outcome, PatientRecord};

/// Request a crew for a new ambulance patient.
pub fn ambulance_dispatch_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<&mut Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::AmbulanceDispatch) else {
        return;
    };
    let now = clock.now();
    let Ok(mut patient) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::AmbulanceDispatch);
        return;
    };
    if let Err(violation) = patient.advance(PatientStage::AmbulanceDispatch) {
        faults.record(now, violation);
        return;
    }
    if let Err(err) = pools.request(
        PoolKind::Ambulance,
        entity,
        1,
        EventKind::AmbulanceAssigned,
        &mut clock,
    ) {
        faults.record(now, err);
    }
}

/// A crew is assigned: drive out and work the scene.
pub fn ambulance_assigned_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    config: Res<AmbulanceConfig>,
    mut faults: ResMut<SimFaults>,
    patients: Query<&Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::AmbulanceAssigned) else {
        return;
    };
    let now = clock.now();
    let Ok(patient) = patients.get(entity) else {
        record_missing_patient(&mut faults, now, EventKind::AmbulanceAssigned);
        return;
    };
    let outbound_travel = rng.sample(&config.travel_to_patient);
    let on_scene = rng.sample(&config.on_scene);
    commands
        .entity(entity)
        .insert(AmbulanceRun { outbound_travel });
    clock.resume_patient(outbound_travel + on_scene, EventKind::AmbulanceOnScene, entity);
    tracing::debug!(patient = patient.id, now, outbound_travel, "ambulance dispatched");
}

/// Decide between transporting the patient and diverting the ambulance.
#[allow(clippy::too_many_arguments)]
pub fn ambulance_on_scene_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    pools: Res<ResourcePools>,
    policy: Res<DiversionPolicy>,
    config: Res<AmbulanceConfig>,
    mut telemetry: ResMut<EdTelemetry>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<(&mut Patient, &AmbulanceRun)>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::AmbulanceOnScene) else {
        return;
    };
    let now = clock.now();
    let Ok((mut patient, run)) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::AmbulanceOnScene);
        return;
    };
    let bed_utilization = pools.pool(PoolKind::Bed).utilization();
    match policy.decide(bed_utilization, patient.acuity) {
        DiversionDecision::Admit => {
            let travel_back = config.return_factor * run.outbound_travel;
            clock.resume_patient(travel_back, EventKind::AmbulanceReturned, entity);
            tracing::debug!(
                patient = patient.id,
                acuity = patient.acuity.level(),
                now,
                bed_utilization,
                "ambulance transporting"
            );
        }
        DiversionDecision::Divert => {
            if let Err(violation) = patient.advance(PatientStage::Diverted) {
                faults.record(now, violation);
                return;
            }
            telemetry.diversions += 1;
            telemetry
                .records
                .push(PatientRecord::close(&patient, Outcome::Diverted, now));
            let diversion_travel = rng.sample(&config.diversion_travel) + run.outbound_travel;
            clock.resume_patient(diversion_travel, EventKind::DiversionTravelComplete, entity);
            tracing::debug!(
                patient = patient.id,
                acuity = patient.acuity.level(),
                now,
                bed_utilization,
                "ambulance diverted"
            );
        }
    }
}

/// The crew is back with the patient, who moves on to triage.
pub fn ambulance_returned_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut faults: ResMut<SimFaults>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::AmbulanceReturned) else {
        return;
    };
    let now = clock.now();
    if let Err(err) = pools.release(PoolKind::Ambulance, entity, &mut clock) {
        faults.record(now, err);
        return;
    }
    commands.entity(entity).remove::<AmbulanceRun>();
    clock.resume_patient(0.0, EventKind::TriageStart, entity);
}

/// The diverted crew is available again; the patient leaves the model.
pub fn diversion_travel_complete_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut faults: ResMut<SimFaults>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::DiversionTravelComplete) else {
        return;
    };
    let now = clock.now();
    if let Err(err) = pools.release(PoolKind::Ambulance, entity, &mut clock) {
        faults.record(now, err);
        return;
    }
    commands.entity(entity).despawn();
}
