use bevy_ecs::prelude::{Commands, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::distributions::SimRng;
use crate::ecs::{Patient, PatientStage};
use crate::error::{InvariantViolation, SimFaults};
use crate::pool::{PoolKind, ResourcePools};
use crate::scenario::DischargeConfig;
use crate::systems::{record_missing_patient, resumed_patient};
use crate::telemetry::{EdTelemetry, Outcome, PatientRecord};

/// Close the patient's record; the bed is released once it has been cleaned.
pub fn discharge_start_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    config: Res<DischargeConfig>,
    mut telemetry: ResMut<EdTelemetry>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<&mut Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::DischargeStart) else {
        return;
    };
    let now = clock.now();
    let Ok(mut patient) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::DischargeStart);
        return;
    };
    let Some(bed_at) = patient.bed_at else {
        faults.record(
            now,
            InvariantViolation::DischargeWithoutBed {
                patient: patient.id,
            },
        );
        return;
    };
    if let Err(violation) = patient.advance(PatientStage::Discharged) {
        faults.record(now, violation);
        return;
    }
    if !(patient.arrived_at <= bed_at && bed_at <= now) {
        faults.record(
            now,
            InvariantViolation::TimestampOrder {
                patient: patient.id,
                arrival: patient.arrived_at,
                bed: bed_at,
                discharge: now,
            },
        );
        return;
    }
    patient.discharged_at = Some(now);
    let record = PatientRecord::close(&patient, Outcome::Discharged, now);
    tracing::debug!(
        patient = record.id,
        acuity = record.acuity,
        now,
        time_in_system = record.time_in_system(),
        "patient discharged"
    );
    telemetry.records.push(record);

    let cleaning = rng.sample(&config.cleaning);
    clock.resume_patient(cleaning, EventKind::BedCleaned, entity);
}

pub fn bed_cleaned_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut faults: ResMut<SimFaults>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::BedCleaned) else {
        return;
    };
    let now = clock.now();
    if let Err(err) = pools.release(PoolKind::Bed, entity, &mut clock) {
        faults.record(now, err);
        return;
    }
    commands.entity(entity).despawn();
}

/// The death has been reported: close the record and give the bed back without cleaning.
pub fn patient_deceased_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut telemetry: ResMut<EdTelemetry>,
    mut faults: ResMut<SimFaults>,
    patients: Query<&Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::PatientDeceased) else {
        return;
    };
    let now = clock.now();
    let Ok(patient) = patients.get(entity) else {
        record_missing_patient(&mut faults, now, EventKind::PatientDeceased);
        return;
    };
    telemetry
        .records
        .push(PatientRecord::close(patient, Outcome::Deceased, now));
    if let Err(err) = pools.release(PoolKind::Bed, entity, &mut clock) {
        faults.record(now, err);
        return;
    }
    commands.entity(entity).despawn();
}
