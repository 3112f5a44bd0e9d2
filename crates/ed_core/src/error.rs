//! Error taxonomy for the engine.
//!
//! Configuration problems are caught before a run starts ([ConfigError]). Broken engine
//! invariants are recorded by systems into [SimFaults] and abort the run through the
//! runner ([SimError::Invariant]).

use bevy_ecs::prelude::Resource;
use thiserror::Error;

use crate::ecs::PatientStage;
use crate::pool::{PoolError, PoolKind};
use crate::protocols::{Complaint, ProcedureKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("capacity of the {pool:?} pool must be positive")]
    NonPositiveCapacity { pool: PoolKind },
    #[error("rate interval {start}..{end} is invalid (hours must be in 0..24, end in 1..=24, start != end)")]
    InvalidRateInterval { start: u8, end: u8 },
    #[error("arrival rates for interval starting at hour {start} must be finite and non-negative")]
    NegativeRate { start: u8 },
    #[error("hour {hour} is not covered by any arrival rate interval")]
    RateScheduleGap { hour: u8 },
    #[error("hour {hour} is covered by more than one arrival rate interval")]
    RateScheduleOverlap { hour: u8 },
    #[error("probabilities in {table} sum to {sum}, expected 1.0")]
    ProbabilitySum { table: String, sum: f64 },
    #[error("probability {value} in {context} is outside [0, 1]")]
    InvalidProbability { context: String, value: f64 },
    #[error("invalid distribution for {context}: {reason}")]
    InvalidDistribution { context: String, reason: String },
    #[error("no treatment plan configured for {0:?}")]
    MissingTreatmentPlan(Complaint),
    #[error("no procedure spec configured for {0:?}")]
    MissingProcedure(ProcedureKind),
    #[error("procedure {procedure:?} must use a staff or equipment pool, not {pool:?}")]
    InvalidProcedurePool {
        procedure: ProcedureKind,
        pool: PoolKind,
    },
    #[error("horizon must be finite and non-negative, got {0}")]
    InvalidHorizon(f64),
    #[error("queue sample interval must be finite and positive, got {0}")]
    InvalidSampleInterval(f64),
    #[error("inter-arrival divisor must be finite and positive, got {0}")]
    InvalidDivisor(f64),
    #[error("diversion threshold must be in (0, 1], got {0}")]
    InvalidDiversionThreshold(f64),
    #[error("acuity level {0} is outside 1..=5")]
    InvalidAcuity(u8),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("patient {patient} attempted illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        patient: u64,
        from: PatientStage,
        to: PatientStage,
    },
    #[error("patient {patient} reached discharge without ever acquiring a bed")]
    DischargeWithoutBed { patient: u64 },
    #[error("patient {patient} timestamps out of order (arrival {arrival}, bed {bed}, discharge {discharge})")]
    TimestampOrder {
        patient: u64,
        arrival: f64,
        bed: f64,
        discharge: f64,
    },
    #[error("event {kind} fired for a patient entity that no longer exists")]
    MissingPatient { kind: String },
    #[error("patient {patient} reached treatment without a chief complaint")]
    MissingComplaint { patient: u64 },
    #[error("patient {patient} resumed a procedure step with no procedure in progress")]
    NoActiveProcedure { patient: u64 },
    #[error("protocol lookup failed: {0}")]
    Protocol(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invariant violated at t={at:.3}: {violation}")]
    Invariant { at: f64, violation: InvariantViolation },
}

/// Invariant violations raised by systems during the current run.
#[derive(Debug, Default, Resource)]
pub struct SimFaults {
    pub violations: Vec<(f64, InvariantViolation)>,
}

impl SimFaults {
    pub fn record(&mut self, at: f64, violation: impl Into<InvariantViolation>) {
        let violation = violation.into();
        tracing::error!(at, %violation, "invariant violated");
        self.violations.push((at, violation));
    }

    pub fn first(&self) -> Option<&(f64, InvariantViolation)> {
        self.violations.first()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}
