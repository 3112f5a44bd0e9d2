//! Metrics extraction from simulation results.
//!
//! This module derives the per-run rates and averages used for capacity planning from an
//! `ed_core` [RunResult]: pool utilization, bed turnover, waits, queue lengths and outcome
//! counts. Every ratio whose denominator is zero reports `0.0`.

use ed_core::pool::PoolKind;
use ed_core::telemetry::{Outcome, RunResult};
use serde::Serialize;

/// Aggregated metrics from a single simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunMetrics {
    /// Seed the run was built with.
    pub seed: u64,
    /// Patients generated before the horizon.
    pub arrivals: u64,
    pub walk_in_arrivals: u64,
    pub ambulance_arrivals: u64,
    pub discharged: u64,
    pub diversions: u64,
    pub deceased: u64,
    /// Patients still in the department at the horizon.
    pub in_system: u64,
    /// Mean triage wait over patients that reached the department.
    pub avg_triage_wait: f64,
    /// Mean treatment wait (bed plus procedure resources).
    pub avg_treatment_wait: f64,
    pub avg_total_wait: f64,
    /// Mean sampled count of patients waiting for a triage nurse.
    pub avg_triage_queue: f64,
    /// Mean sampled bed queue length.
    pub avg_treatment_queue: f64,
    pub bed_utilization: f64,
    pub nurse_utilization: f64,
    pub doctor_utilization: f64,
    pub ambulance_utilization: f64,
    pub xray_utilization: f64,
    pub ct_utilization: f64,
    pub oxygen_utilization: f64,
    /// Bed-occupied minutes of closed records over bed-minutes available.
    pub bed_turnover_rate: f64,
    /// Time in system of discharged patients.
    pub avg_time_in_system: f64,
    pub median_time_in_system: f64,
    pub p90_time_in_system: f64,
}

impl RunMetrics {
    /// Calculate mean, median and p90 from a slice of values.
    pub(crate) fn calculate_stats(values: &[f64]) -> (f64, f64, f64) {
        if values.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let avg = sorted.iter().sum::<f64>() / sorted.len() as f64;
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };
        // floor(0.9 * (n - 1)) as the p90 index
        let p90_idx = ((sorted.len() - 1) as f64 * 0.9) as usize;
        let p90 = sorted[p90_idx.min(sorted.len() - 1)];

        (avg, median, p90)
    }

    /// Names reported by [RunMetrics::named], in the same order.
    pub fn metric_names() -> Vec<&'static str> {
        Self::default()
            .named()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// Metric name/value pairs, in report order.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("arrivals", self.arrivals as f64),
            ("walk_in_arrivals", self.walk_in_arrivals as f64),
            ("ambulance_arrivals", self.ambulance_arrivals as f64),
            ("discharged", self.discharged as f64),
            ("diversions", self.diversions as f64),
            ("deceased", self.deceased as f64),
            ("in_system", self.in_system as f64),
            ("avg_triage_wait", self.avg_triage_wait),
            ("avg_treatment_wait", self.avg_treatment_wait),
            ("avg_total_wait", self.avg_total_wait),
            ("avg_triage_queue", self.avg_triage_queue),
            ("avg_treatment_queue", self.avg_treatment_queue),
            ("bed_utilization", self.bed_utilization),
            ("nurse_utilization", self.nurse_utilization),
            ("doctor_utilization", self.doctor_utilization),
            ("ambulance_utilization", self.ambulance_utilization),
            ("xray_utilization", self.xray_utilization),
            ("ct_utilization", self.ct_utilization),
            ("oxygen_utilization", self.oxygen_utilization),
            ("bed_turnover_rate", self.bed_turnover_rate),
            ("avg_time_in_system", self.avg_time_in_system),
            ("median_time_in_system", self.median_time_in_system),
            ("p90_time_in_system", self.p90_time_in_system),
        ]
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    ratio(sum, count as f64)
}

/// Busy time over capacity-minutes for `kind`.
fn utilization(result: &RunResult, kind: PoolKind) -> f64 {
    result
        .usage(kind)
        .map(|usage| ratio(usage.busy_time, usage.capacity as f64 * result.horizon))
        .unwrap_or(0.0)
}

/// Derive [RunMetrics] from a finished run.
pub fn extract_metrics(result: &RunResult) -> RunMetrics {
    let count = |outcome: Outcome| result.records_with(outcome).count() as u64;

    // Diverted patients never reach triage, so they are left out of the wait averages.
    let treated: Vec<_> = result
        .records
        .iter()
        .filter(|record| record.outcome != Outcome::Diverted)
        .collect();
    let avg_triage_wait = mean(treated.iter().map(|record| record.triage_wait));
    let avg_treatment_wait = mean(treated.iter().map(|record| record.treatment_wait));
    let avg_total_wait = mean(treated.iter().map(|record| record.total_wait()));

    let avg_triage_queue = mean(
        result
            .queue_samples
            .iter()
            .map(|sample| sample.triage_queue as f64),
    );
    let avg_treatment_queue = mean(
        result
            .queue_samples
            .iter()
            .map(|sample| sample.treatment_queue as f64),
    );

    let bed_occupied: f64 = result
        .records
        .iter()
        .filter_map(|record| record.bed_occupied())
        .sum();
    let bed_turnover_rate = ratio(
        bed_occupied,
        result.capacities.beds as f64 * result.horizon,
    );

    let times: Vec<f64> = result
        .records_with(Outcome::Discharged)
        .map(|record| record.time_in_system())
        .collect();
    let (avg_time_in_system, median_time_in_system, p90_time_in_system) =
        RunMetrics::calculate_stats(&times);

    RunMetrics {
        seed: result.seed,
        arrivals: result.arrivals(),
        walk_in_arrivals: result.walk_in_arrivals,
        ambulance_arrivals: result.ambulance_arrivals,
        discharged: count(Outcome::Discharged),
        diversions: result.diversions,
        deceased: count(Outcome::Deceased),
        in_system: result.in_system as u64,
        avg_triage_wait,
        avg_treatment_wait,
        avg_total_wait,
        avg_triage_queue,
        avg_treatment_queue,
        bed_utilization: utilization(result, PoolKind::Bed),
        nurse_utilization: utilization(result, PoolKind::Nurse),
        doctor_utilization: utilization(result, PoolKind::Doctor),
        ambulance_utilization: utilization(result, PoolKind::Ambulance),
        xray_utilization: utilization(result, PoolKind::XRay),
        ct_utilization: utilization(result, PoolKind::CtScanner),
        oxygen_utilization: utilization(result, PoolKind::OxygenSupply),
        bed_turnover_rate,
        avg_time_in_system,
        median_time_in_system,
        p90_time_in_system,
    }
}
