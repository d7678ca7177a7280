// vigil/src/commands/show.rs
//
// USE CASE: Print a persisted anomaly report.

use std::path::Path;

use anyhow::Context;
use vigil_core::domain::detection::FullReport;

use super::print_report;

pub fn execute(path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {:?}", path))?;
    let report: FullReport = serde_json::from_str(&content)
        .with_context(|| format!("{:?} is not an anomaly report", path))?;

    print_report(&report);
    println!("\n   Total anomalies: {}", report.total_anomalies());
    Ok(())
}
