//! Telemetry: per-run counters, queue samples and closed patient records.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::{ArrivalMode, Patient};
use crate::pool::{Capacities, PoolUsage};
use crate::protocols::Complaint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Discharged,
    Diverted,
    Deceased,
}

/// One patient journey, closed at discharge, diversion or death.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRecord {
    pub id: u64,
    pub acuity: u8,
    pub arrival_mode: ArrivalMode,
    pub complaint: Option<Complaint>,
    pub outcome: Outcome,
    pub arrived_at: f64,
    pub bed_at: Option<f64>,
    pub closed_at: f64,
    pub triage_wait: f64,
    pub treatment_wait: f64,
}

impl PatientRecord {
    pub fn close(patient: &Patient, outcome: Outcome, closed_at: f64) -> Self {
        Self {
            id: patient.id,
            acuity: patient.acuity.level(),
            arrival_mode: patient.arrival_mode,
            complaint: patient.complaint,
            outcome,
            arrived_at: patient.arrived_at,
            bed_at: patient.bed_at,
            closed_at,
            triage_wait: patient.triage_wait,
            treatment_wait: patient.treatment_wait,
        }
    }

    pub fn time_in_system(&self) -> f64 {
        (self.closed_at - self.arrived_at).max(0.0)
    }

    /// Minutes between bed acquisition and the record closing.
    pub fn bed_occupied(&self) -> Option<f64> {
        self.bed_at.map(|bed_at| (self.closed_at - bed_at).max(0.0))
    }

    pub fn total_wait(&self) -> f64 {
        self.triage_wait + self.treatment_wait
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QueueSample {
    pub at: f64,
    /// Patients waiting for a triage nurse; nurse requests for procedures are not counted.
    pub triage_queue: usize,
    /// Requests waiting on the bed pool.
    pub treatment_queue: usize,
}

#[derive(Debug, Default, Resource)]
pub struct EdTelemetry {
    pub walk_in_arrivals: u64,
    pub ambulance_arrivals: u64,
    pub diversions: u64,
    /// Arrival loop checks that landed in a zero-rate interval.
    pub idle_intervals: u64,
    pub queue_samples: Vec<QueueSample>,
    pub records: Vec<PatientRecord>,
}

impl EdTelemetry {
    pub fn record_arrival(&mut self, mode: ArrivalMode) {
        match mode {
            ArrivalMode::WalkIn => self.walk_in_arrivals += 1,
            ArrivalMode::Ambulance => self.ambulance_arrivals += 1,
        }
    }

    pub fn arrivals(&self) -> u64 {
        self.walk_in_arrivals + self.ambulance_arrivals
    }
}

/// Identifies the run a [RunResult] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Resource)]
pub struct RunInfo {
    pub seed: u64,
    pub horizon: f64,
    pub capacities: Capacities,
}

/// Immutable outcome of one run, taken at the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub horizon: f64,
    pub capacities: Capacities,
    pub walk_in_arrivals: u64,
    pub ambulance_arrivals: u64,
    pub diversions: u64,
    pub queue_samples: Vec<QueueSample>,
    pub records: Vec<PatientRecord>,
    pub pool_usage: Vec<PoolUsage>,
    /// Patients whose journey had not ended at the horizon.
    pub in_system: usize,
}

impl RunResult {
    pub fn arrivals(&self) -> u64 {
        self.walk_in_arrivals + self.ambulance_arrivals
    }

    pub fn records_with(&self, outcome: Outcome) -> impl Iterator<Item = &PatientRecord> {
        self.records.iter().filter(move |r| r.outcome == outcome)
    }

    pub fn usage(&self, kind: crate::pool::PoolKind) -> Option<&PoolUsage> {
        self.pool_usage.iter().find(|usage| usage.kind == kind)
    }
}
