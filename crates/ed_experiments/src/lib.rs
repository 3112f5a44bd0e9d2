//! Replication and capacity-planning experiments for the emergency department simulation.
//!
//! This crate runs many independent seeded replications of an `ed_core` scenario in
//! parallel, extracts per-run metrics, and aggregates them into mean and standard
//! deviation reports. Capacity sweeps repeat that for every combination of beds, nurses,
//! doctors and ambulances in a grid.
//!
//! # Quick Start
//!
//! ```no_run
//! use ed_core::scenario::ScenarioParams;
//! use ed_experiments::{find_lowest_diversion, run_capacity_sweep, run_replications};
//! use ed_experiments::{CapacitySpace, ReplicationOptions};
//!
//! // Thirty replications of the default day
//! let report = run_replications(&ScenarioParams::default(), 30, ReplicationOptions::default())?;
//! report.log_summary();
//!
//! // Sweep bed and nurse counts
//! let space = CapacitySpace::grid()
//!     .beds(vec![30, 40, 50])
//!     .nurses(vec![12, 15]);
//! let results = run_capacity_sweep(&space, 10, ReplicationOptions::default())?;
//! let best = find_lowest_diversion(&results);
//! # Ok::<(), ed_experiments::ReplicationError>(())
//! ```
//!
//! # Architecture
//!
//! - [`runner`]: Parallel replication execution using rayon
//! - [`metrics`]: Metrics extraction from a single run
//! - [`report`]: Mean and standard deviation across replications
//! - [`parameters`]: Capacity grid and sweep
//! - [`export`]: Result export to JSON/CSV

pub mod error;
pub mod export;
pub mod metrics;
pub mod parameters;
pub mod report;
pub mod runner;

pub use error::ReplicationError;
pub use export::{export_runs_to_csv, export_sweep_to_csv, export_to_json};
pub use metrics::{extract_metrics, RunMetrics};
pub use parameters::{find_lowest_diversion, run_capacity_sweep, CapacityPoint, CapacitySpace};
pub use report::ReplicationReport;
pub use runner::{run_replication, run_replications, ReplicationOptions};
