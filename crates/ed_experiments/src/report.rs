//! Aggregate report over a replication set.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::RunMetrics;

/// Mean and sample standard deviation of every named metric across runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicationReport {
    pub replications: usize,
    pub base_seed: u64,
    pub means: BTreeMap<String, f64>,
    pub std_devs: BTreeMap<String, f64>,
    /// Per-run metrics in replication order.
    pub runs: Vec<RunMetrics>,
}

impl ReplicationReport {
    pub fn from_runs(base_seed: u64, runs: Vec<RunMetrics>) -> Self {
        let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for run in &runs {
            for (name, value) in run.named() {
                columns.entry(name.to_string()).or_default().push(value);
            }
        }

        let mut means = BTreeMap::new();
        let mut std_devs = BTreeMap::new();
        for (name, values) in columns {
            let (mean, std_dev) = mean_and_std_dev(&values);
            means.insert(name.clone(), mean);
            std_devs.insert(name, std_dev);
        }

        Self {
            replications: runs.len(),
            base_seed,
            means,
            std_devs,
            runs,
        }
    }

    pub fn mean(&self, metric: &str) -> Option<f64> {
        self.means.get(metric).copied()
    }

    pub fn std_dev(&self, metric: &str) -> Option<f64> {
        self.std_devs.get(metric).copied()
    }

    /// One `info!` line per metric.
    pub fn log_summary(&self) {
        tracing::info!(
            replications = self.replications,
            base_seed = self.base_seed,
            "replication summary"
        );
        for (name, mean) in &self.means {
            let std_dev = self.std_devs.get(name).copied().unwrap_or(0.0);
            tracing::info!(metric = %name, mean, std_dev, "metric");
        }
    }
}

/// Sample standard deviation (n - 1); zero for fewer than two values.
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}
