use crate::metrics::RunMetrics;
use crate::parameters::CapacityPoint;
use crate::report::ReplicationReport;

const POINT_COLUMNS: [&str; 4] = ["beds", "nurses", "doctors", "ambulances"];

pub(crate) fn export_runs_to_csv_impl(
    runs: &[RunMetrics],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    let mut header = vec!["replication", "seed"];
    header.extend(RunMetrics::metric_names());
    wtr.write_record(&header)?;

    for (index, run) in runs.iter().enumerate() {
        let mut row = vec![index.to_string(), run.seed.to_string()];
        row.extend(run.named().into_iter().map(|(_, value)| value.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub(crate) fn export_sweep_to_csv_impl(
    results: &[(CapacityPoint, ReplicationReport)],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);
    let names = RunMetrics::metric_names();

    let mut header: Vec<String> = POINT_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.push("replications".to_string());
    for name in &names {
        header.push(format!("{name}_mean"));
        header.push(format!("{name}_std_dev"));
    }
    wtr.write_record(&header)?;

    for (point, report) in results {
        let mut row = vec![
            point.beds.to_string(),
            point.nurses.to_string(),
            point.doctors.to_string(),
            point.ambulances.to_string(),
            report.replications.to_string(),
        ];
        for name in &names {
            row.push(report.mean(name).unwrap_or(0.0).to_string());
            row.push(report.std_dev(name).unwrap_or(0.0).to_string());
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
