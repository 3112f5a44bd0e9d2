use bevy_ecs::prelude::{Query, Res, ResMut};
use rand::Rng;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::distributions::SimRng;
use crate::ecs::{Patient, PatientStage};
use crate::error::SimFaults;
use crate::pool::{PoolKind, ResourcePools};
use crate::protocols::Protocols;
use crate::scenario::TriageConfig;
use crate::systems::{record_missing_patient, resumed_patient};

/// Assign a primary doctor and chief complaint, then queue for a triage nurse. Acuity 1
/// goes straight to treatment.
pub fn triage_start_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut rng: ResMut<SimRng>,
    protocols: Res<Protocols>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<&mut Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::TriageStart) else {
        return;
    };
    let now = clock.now();
    let Ok(mut patient) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::TriageStart);
        return;
    };
    if let Err(violation) = patient.advance(PatientStage::Triage) {
        faults.record(now, violation);
        return;
    }

    let doctors = pools.pool(PoolKind::Doctor).capacity();
    patient.primary_doctor = Some(rng.0.gen_range(1..=doctors));
    match protocols.sample_complaint(patient.acuity, &mut rng.0) {
        Ok(complaint) => patient.complaint = Some(complaint),
        Err(err) => {
            faults.record(now, err);
            return;
        }
    }
    tracing::debug!(
        patient = patient.id,
        acuity = patient.acuity.level(),
        complaint = ?patient.complaint,
        now,
        "triage started"
    );

    if patient.acuity.skips_triage() {
        clock.resume_patient(0.0, EventKind::TreatmentStart, entity);
        return;
    }
    patient.begin_wait(now);
    if let Err(err) = pools.request(
        PoolKind::Nurse,
        entity,
        1,
        EventKind::TriageStaffAcquired,
        &mut clock,
    ) {
        faults.record(now, err);
    }
}

pub fn triage_staff_acquired_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    config: Res<TriageConfig>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<&mut Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::TriageStaffAcquired) else {
        return;
    };
    let now = clock.now();
    let Ok(mut patient) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::TriageStaffAcquired);
        return;
    };
    let waited = patient.end_wait(now);
    patient.triage_wait += waited;
    let duration = rng.sample(config.duration_for(patient.acuity));
    clock.resume_patient(duration, EventKind::TriageComplete, entity);
}

pub fn triage_complete_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut faults: ResMut<SimFaults>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::TriageComplete) else {
        return;
    };
    let now = clock.now();
    if let Err(err) = pools.release(PoolKind::Nurse, entity, &mut clock) {
        faults.record(now, err);
        return;
    }
    clock.resume_patient(0.0, EventKind::TreatmentStart, entity);
}
