//! Result export utilities.
//!
//! Replication reports are written as JSON; per-run metrics and capacity sweeps as CSV.
//! Parent directories of the output path are created when missing.

use std::path::Path;

use crate::metrics::RunMetrics;
use crate::parameters::CapacityPoint;
use crate::report::ReplicationReport;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/writer_utils.rs"]
mod writer_utils;

/// Export a replication report (means, standard deviations and runs) to JSON.
///
/// # Errors
///
/// Returns an error if file creation or JSON serialization fails.
pub fn export_to_json(
    report: &ReplicationReport,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(report, file)
}

/// Export per-run metrics to CSV, one row per replication.
///
/// # Errors
///
/// Returns an error if `runs` is empty, or if file creation or CSV writing fails.
pub fn export_runs_to_csv(
    runs: &[RunMetrics],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(runs)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_runs_to_csv_impl(runs, file)
}

/// Export a capacity sweep to CSV: capacity columns, then mean and std dev per metric.
///
/// # Errors
///
/// Returns an error if `results` is empty, or if file creation or CSV writing fails.
pub fn export_sweep_to_csv(
    results: &[(CapacityPoint, ReplicationReport)],
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    writer_utils::ensure_not_empty(results)?;
    let file = writer_utils::create_output_file(path)?;
    csv::export_sweep_to_csv_impl(results, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    fn run(seed: u64, diversions: u64) -> RunMetrics {
        RunMetrics {
            seed,
            arrivals: 100,
            walk_in_arrivals: 80,
            ambulance_arrivals: 20,
            discharged: 90,
            diversions,
            bed_utilization: 0.75,
            avg_total_wait: 12.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_export_to_json() {
        let report = ReplicationReport::from_runs(7, vec![run(7, 2), run(8, 4)]);
        let file = NamedTempFile::new().unwrap();
        export_to_json(&report, file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["replications"], 2);
        assert_eq!(value["means"]["diversions"], 3.0);
        assert_eq!(value["runs"][1]["seed"], 8);
    }

    #[test]
    fn runs_csv_has_one_row_per_replication() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("runs.csv");
        export_runs_to_csv(&[run(1, 0), run(2, 5)], &path).unwrap();

        let mut reader = ::csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "replication");
        assert_eq!(&headers[1], "seed");
        assert_eq!(headers.len(), 2 + RunMetrics::metric_names().len());

        let diversions = headers.iter().position(|h| h == "diversions").unwrap();
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "2");
        assert_eq!(&rows[1][diversions], "5");
    }

    #[test]
    fn sweep_csv_pairs_points_with_summaries() {
        let point = CapacityPoint {
            beds: 30,
            nurses: 12,
            doctors: 6,
            ambulances: 8,
        };
        let report = ReplicationReport::from_runs(1, vec![run(1, 2), run(2, 6)]);
        let file = NamedTempFile::new().unwrap();
        export_sweep_to_csv(&[(point, report)], file.path()).unwrap();

        let mut reader = ::csv::Reader::from_path(file.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[column("beds")], "30");
        assert_eq!(&row[column("replications")], "2");
        assert_eq!(&row[column("diversions_mean")], "4");
    }

    #[test]
    fn empty_exports_are_rejected() {
        let file = NamedTempFile::new().unwrap();
        assert!(export_runs_to_csv(&[], file.path()).is_err());
        assert!(export_sweep_to_csv(&[], file.path()).is_err());
    }
}
