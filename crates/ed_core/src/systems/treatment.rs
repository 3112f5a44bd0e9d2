//! Treatment: bed, evaluation, then the complaint's procedure list repeated with rests.
//!
//! A procedure's units are requested one pool at a time in [PoolKind] order while the bed
//! stays held, and are all released when the procedure completes.

use bevy_ecs::prelude::{Commands, Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::distributions::SimRng;
use crate::ecs::{ActiveProcedure, Patient, PatientStage, TreatmentProgress};
use crate::error::{InvariantViolation, SimFaults};
use crate::pool::{PoolError, PoolKind, ResourcePools};
use crate::protocols::{Protocols, TreatmentPlan};
use crate::systems::{record_missing_patient, resumed_patient};

fn plan_for<'a>(
    protocols: &'a Protocols,
    patient: &Patient,
) -> Result<&'a TreatmentPlan, InvariantViolation> {
    let complaint = patient
        .complaint
        .ok_or(InvariantViolation::MissingComplaint {
            patient: patient.id,
        })?;
    Ok(protocols.plan(complaint)?)
}

/// Queue for the next pool of the active procedure.
fn request_next_unit(
    entity: Entity,
    patient: &mut Patient,
    active: &ActiveProcedure,
    pools: &mut ResourcePools,
    clock: &mut SimulationClock,
) -> Result<(), PoolError> {
    let Some(&(pool, units)) = active.to_acquire.first() else {
        return Ok(());
    };
    patient.begin_wait(clock.now());
    pools.request(pool, entity, units, EventKind::ProcedureResourceAcquired, clock)?;
    Ok(())
}

pub fn treatment_start_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<&mut Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::TreatmentStart) else {
        return;
    };
    let now = clock.now();
    let Ok(mut patient) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::TreatmentStart);
        return;
    };
    if let Err(violation) = patient.advance(PatientStage::InTreatment) {
        faults.record(now, violation);
        return;
    }
    patient.begin_wait(now);
    if let Err(err) = pools.request(PoolKind::Bed, entity, 1, EventKind::BedAcquired, &mut clock)
    {
        faults.record(now, err);
    }
}

pub fn bed_acquired_system(
    mut commands: Commands,
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    protocols: Res<Protocols>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<&mut Patient>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::BedAcquired) else {
        return;
    };
    let now = clock.now();
    let Ok(mut patient) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::BedAcquired);
        return;
    };
    let waited = patient.end_wait(now);
    patient.treatment_wait += waited;
    patient.bed_at = Some(now);

    let plan = match plan_for(&protocols, &patient) {
        Ok(plan) => plan,
        Err(violation) => {
            faults.record(now, violation);
            return;
        }
    };
    let evaluation = rng.sample(&plan.evaluation);
    commands.entity(entity).insert(TreatmentProgress::default());
    clock.resume_patient(evaluation, EventKind::EvaluationComplete, entity);
    tracing::debug!(
        patient = patient.id,
        acuity = patient.acuity.level(),
        now,
        waited,
        "bed acquired"
    );
}

pub fn evaluation_complete_system(event: Res<CurrentEvent>, mut clock: ResMut<SimulationClock>) {
    let Some(entity) = resumed_patient(&event, EventKind::EvaluationComplete) else {
        return;
    };
    clock.resume_patient(0.0, EventKind::ProcedureNext, entity);
}

/// Draw the remaining procedures of the current repetition until one is performed; rest
/// once the list is exhausted.
#[allow(clippy::too_many_arguments)]
pub fn procedure_next_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut rng: ResMut<SimRng>,
    protocols: Res<Protocols>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<(&mut Patient, &mut TreatmentProgress)>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::ProcedureNext) else {
        return;
    };
    let now = clock.now();
    let Ok((mut patient, mut progress)) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::ProcedureNext);
        return;
    };
    let plan = match plan_for(&protocols, &patient) {
        Ok(plan) => plan,
        Err(violation) => {
            faults.record(now, violation);
            return;
        }
    };

    while let Some(&(kind, probability)) = plan.procedures.get(progress.next_procedure) {
        progress.next_procedure += 1;
        if !rng.chance(probability) {
            continue;
        }
        let spec = match protocols.procedure(kind) {
            Ok(spec) => spec,
            Err(err) => {
                faults.record(now, err);
                return;
            }
        };
        let to_acquire = spec.units(&mut rng.0, |pool| pools.pool(pool).capacity());
        let active = ActiveProcedure {
            kind,
            to_acquire,
            held: Vec::new(),
        };
        tracing::debug!(patient = patient.id, procedure = ?kind, now, "procedure ordered");
        if let Err(err) = request_next_unit(entity, &mut patient, &active, &mut pools, &mut clock)
        {
            faults.record(now, err);
        }
        progress.active = Some(active);
        return;
    }

    let rest = rng.sample(&plan.rest);
    clock.resume_patient(rest, EventKind::RestComplete, entity);
}

pub fn procedure_resource_acquired_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut rng: ResMut<SimRng>,
    protocols: Res<Protocols>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<(&mut Patient, &mut TreatmentProgress)>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::ProcedureResourceAcquired) else {
        return;
    };
    let now = clock.now();
    let Ok((mut patient, mut progress)) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::ProcedureResourceAcquired);
        return;
    };
    let waited = patient.end_wait(now);
    patient.treatment_wait += waited;

    let Some(active) = progress.active.as_mut() else {
        faults.record(now, InvariantViolation::NoActiveProcedure { patient: patient.id });
        return;
    };
    if active.to_acquire.is_empty() {
        faults.record(now, InvariantViolation::NoActiveProcedure { patient: patient.id });
        return;
    }
    let (pool, _) = active.to_acquire.remove(0);
    active.held.push(pool);

    if !active.to_acquire.is_empty() {
        if let Err(err) = request_next_unit(entity, &mut patient, active, &mut pools, &mut clock) {
            faults.record(now, err);
        }
        return;
    }
    match protocols.procedure(active.kind) {
        Ok(spec) => {
            let duration = rng.sample(&spec.duration);
            clock.resume_patient(duration, EventKind::ProcedureComplete, entity);
        }
        Err(err) => faults.record(now, err),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn procedure_complete_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut pools: ResMut<ResourcePools>,
    mut rng: ResMut<SimRng>,
    protocols: Res<Protocols>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<(&mut Patient, &mut TreatmentProgress)>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::ProcedureComplete) else {
        return;
    };
    let now = clock.now();
    let Ok((mut patient, mut progress)) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::ProcedureComplete);
        return;
    };
    let Some(active) = progress.active.take() else {
        faults.record(now, InvariantViolation::NoActiveProcedure { patient: patient.id });
        return;
    };
    for &pool in active.held.iter().rev() {
        if let Err(err) = pools.release(pool, entity, &mut clock) {
            faults.record(now, err);
            return;
        }
    }

    let spec = match protocols.procedure(active.kind) {
        Ok(spec) => spec,
        Err(err) => {
            faults.record(now, err);
            return;
        }
    };
    if let Some(risk) = spec.surgery {
        if rng.chance(risk.death) {
            if let Err(violation) = patient.advance(PatientStage::Deceased) {
                faults.record(now, violation);
                return;
            }
            let delay = rng.sample(protocols.death_reporting_delay());
            clock.resume_patient(delay, EventKind::PatientDeceased, entity);
            tracing::debug!(
                patient = patient.id,
                procedure = ?active.kind,
                now,
                "patient died in surgery"
            );
            return;
        }
    }
    clock.resume_patient(0.0, EventKind::ProcedureNext, entity);
}

pub fn rest_complete_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    protocols: Res<Protocols>,
    mut faults: ResMut<SimFaults>,
    mut patients: Query<(&Patient, &mut TreatmentProgress)>,
) {
    let Some(entity) = resumed_patient(&event, EventKind::RestComplete) else {
        return;
    };
    let now = clock.now();
    let Ok((patient, mut progress)) = patients.get_mut(entity) else {
        record_missing_patient(&mut faults, now, EventKind::RestComplete);
        return;
    };
    let plan = match plan_for(&protocols, patient) {
        Ok(plan) => plan,
        Err(violation) => {
            faults.record(now, violation);
            return;
        }
    };
    progress.repetition += 1;
    if progress.repetition < plan.repetitions {
        progress.next_procedure = 0;
        clock.resume_patient(0.0, EventKind::ProcedureNext, entity);
    } else {
        clock.resume_patient(0.0, EventKind::DischargeStart, entity);
    }
}
