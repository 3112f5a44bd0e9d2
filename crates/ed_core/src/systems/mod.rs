//! One system per [EventKind]. The runner gates each system on the kind of the current
//! event, so exactly one journey step runs per scheduler step.

pub mod ambulance;
pub mod arrival;
pub mod discharge;
pub mod queue_sample;
pub mod treatment;
pub mod triage;

use bevy_ecs::prelude::Entity;

use crate::clock::{CurrentEvent, EventKind};
use crate::error::{InvariantViolation, SimFaults};

/// The patient the current event resumes, if the event is of `kind`.
pub(crate) fn resumed_patient(event: &CurrentEvent, kind: EventKind) -> Option<Entity> {
    if event.0.kind != kind {
        return None;
    }
    event.0.patient()
}

pub(crate) fn record_missing_patient(faults: &mut SimFaults, now: f64, kind: EventKind) {
    faults.record(
        now,
        InvariantViolation::MissingPatient {
            kind: format!("{kind:?}"),
        },
    );
}
