//! Parallel replication execution using rayon.
//!
//! Every replication builds its own world from the shared [ScenarioParams] with seed
//! `base_seed + i` (wrapping), so runs share no mutable state and may execute concurrently.

use ed_core::runner::run_simulation;
use ed_core::scenario::ScenarioParams;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::error::ReplicationError;
use crate::metrics::{extract_metrics, RunMetrics};
use crate::report::ReplicationReport;

/// Execution settings for a replication set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicationOptions {
    /// Worker threads; rayon's default when `None`.
    pub threads: Option<usize>,
    pub show_progress: bool,
}

/// Seed of replication `index`.
pub fn replication_seed(base_seed: u64, index: usize) -> u64 {
    base_seed.wrapping_add(index as u64)
}

/// Run replication `index` of `params` and derive its metrics.
pub fn run_replication(
    params: &ScenarioParams,
    index: usize,
) -> Result<RunMetrics, ReplicationError> {
    let seed = replication_seed(params.seed, index);
    let result = run_simulation(params.clone().with_seed(seed)).map_err(|source| {
        ReplicationError {
            replication: index,
            seed,
            source,
        }
    })?;
    let metrics = extract_metrics(&result);
    tracing::info!(
        replication = index,
        seed,
        arrivals = metrics.arrivals,
        diversions = metrics.diversions,
        bed_utilization = metrics.bed_utilization,
        "replication finished"
    );
    Ok(metrics)
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

/// Run `replications` independent runs of `params` and aggregate them.
///
/// Runs execute in parallel; results are kept in replication order. The first failing
/// replication (by index) is returned as the error and no report is produced.
pub fn run_replications(
    params: &ScenarioParams,
    replications: usize,
    options: ReplicationOptions,
) -> Result<ReplicationReport, ReplicationError> {
    let bar = (options.show_progress && replications > 0).then(|| progress_bar(replications));

    let run_all = || -> Vec<Result<RunMetrics, ReplicationError>> {
        (0..replications)
            .into_par_iter()
            .map(|index| {
                let outcome = run_replication(params, index);
                if let Some(ref bar) = bar {
                    bar.inc(1);
                }
                outcome
            })
            .collect()
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = options.threads {
        builder = builder.num_threads(threads);
    }
    let outcomes = match builder.build() {
        Ok(pool) => pool.install(run_all),
        Err(err) => {
            tracing::warn!(error = %err, "falling back to the global rayon pool");
            run_all()
        }
    };

    if let Some(ref bar) = bar {
        bar.finish_with_message("Completed");
    }

    let runs = outcomes
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| {
            tracing::error!(
                replication = err.replication,
                seed = err.seed,
                error = %err.source,
                "replication set failed"
            );
            err
        })?;
    Ok(ReplicationReport::from_runs(params.seed, runs))
}
