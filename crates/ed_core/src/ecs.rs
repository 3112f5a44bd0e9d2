use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, InvariantViolation};
use crate::pool::PoolKind;
use crate::protocols::{Complaint, ProcedureKind};

/// Triage acuity level, 1 (most severe) to 5.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Acuity(u8);

impl Acuity {
    pub const LEVELS: [u8; 5] = [1, 2, 3, 4, 5];

    pub fn new(level: u8) -> Result<Self, ConfigError> {
        if Self::LEVELS.contains(&level) {
            Ok(Self(level))
        } else {
            Err(ConfigError::InvalidAcuity(level))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Acuity 1 goes straight to treatment without waiting for a triage nurse.
    pub fn skips_triage(self) -> bool {
        self.0 == 1
    }

    /// Acuity 2 and 3 get the short triage assessment.
    pub fn is_urgent(self) -> bool {
        matches!(self.0, 2 | 3)
    }
}

impl TryFrom<u8> for Acuity {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Acuity::new(level)
    }
}

impl From<Acuity> for u8 {
    fn from(acuity: Acuity) -> u8 {
        acuity.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalMode {
    WalkIn,
    Ambulance,
}

impl ArrivalMode {
    pub fn name(self) -> &'static str {
        match self {
            ArrivalMode::WalkIn => "walk_in",
            ArrivalMode::Ambulance => "ambulance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientStage {
    Arrived,
    AmbulanceDispatch,
    Triage,
    InTreatment,
    Discharged,
    Diverted,
    Deceased,
}

impl PatientStage {
    pub fn can_transition_to(self, next: PatientStage) -> bool {
        use PatientStage::*;
        matches!(
            (self, next),
            (Arrived, AmbulanceDispatch)
                | (Arrived, Triage)
                | (AmbulanceDispatch, Triage)
                | (AmbulanceDispatch, Diverted)
                | (Triage, InTreatment)
                | (InTreatment, Discharged)
                | (InTreatment, Deceased)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PatientStage::Discharged | PatientStage::Diverted | PatientStage::Deceased
        )
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Patient {
    /// Sequential id assigned by the arrival generator, starting at 1.
    pub id: u64,
    pub acuity: Acuity,
    pub arrival_mode: ArrivalMode,
    pub arrived_at: f64,
    pub stage: PatientStage,
    /// Identifier of the attending doctor (1..=doctors); not a hold on the doctor pool.
    pub primary_doctor: Option<u32>,
    pub complaint: Option<Complaint>,
    pub bed_at: Option<f64>,
    pub discharged_at: Option<f64>,
    pub triage_wait: f64,
    pub treatment_wait: f64,
    /// Set while the patient is queued on a pool.
    pub waiting_since: Option<f64>,
}

impl Patient {
    pub fn new(id: u64, acuity: Acuity, arrival_mode: ArrivalMode, arrived_at: f64) -> Self {
        Self {
            id,
            acuity,
            arrival_mode,
            arrived_at,
            stage: PatientStage::Arrived,
            primary_doctor: None,
            complaint: None,
            bed_at: None,
            discharged_at: None,
            triage_wait: 0.0,
            treatment_wait: 0.0,
            waiting_since: None,
        }
    }

    pub fn advance(&mut self, next: PatientStage) -> Result<(), InvariantViolation> {
        if !self.stage.can_transition_to(next) {
            return Err(InvariantViolation::IllegalTransition {
                patient: self.id,
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    pub fn begin_wait(&mut self, now: f64) {
        self.waiting_since = Some(now);
    }

    /// Minutes spent since the last [Patient::begin_wait]; zero if none is open.
    pub fn end_wait(&mut self, now: f64) -> f64 {
        self.waiting_since
            .take()
            .map(|since| (now - since).max(0.0))
            .unwrap_or(0.0)
    }
}

/// Present while the patient is being transported by an ambulance crew.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct AmbulanceRun {
    /// Drive time from the hospital to the patient; the return legs scale from it.
    pub outbound_travel: f64,
}

/// A procedure whose resources are being gathered or used.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveProcedure {
    pub kind: ProcedureKind,
    /// Units still to request, in acquisition order.
    pub to_acquire: Vec<(PoolKind, u32)>,
    /// Pools on which this procedure currently holds units.
    pub held: Vec<PoolKind>,
}

/// Position in the treatment plan. Added once the patient has a bed.
#[derive(Debug, Clone, PartialEq, Default, Component)]
pub struct TreatmentProgress {
    /// Completed repetitions of the procedure list.
    pub repetition: u32,
    /// Index of the next `(procedure, probability)` entry to draw.
    pub next_procedure: usize,
    pub active: Option<ActiveProcedure>,
}
