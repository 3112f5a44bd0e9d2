use crate::report::ReplicationReport;

pub(crate) fn export_to_json_impl(
    report: &ReplicationReport,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
