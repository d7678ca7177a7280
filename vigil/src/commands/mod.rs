// vigil/src/commands/mod.rs

pub mod detect;
pub mod run;
pub mod show;

use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use vigil_core::domain::detection::FullReport;

/// One table per check: header line, then the anomalies sorted as stored.
pub(crate) fn print_report(report: &FullReport) {
    let details = &report.pipeline_run_details;
    println!(
        "📈 {} | {} | {}",
        details.metric_desc, details.method, details.analysis_mode
    );

    for check in &report.anomaly_checks {
        println!(
            "\n   {} : {} anomalies / {} points",
            check.check_label(),
            check.anomaly_count,
            check.total_points
        );
        println!("   {}", check.limit_description);

        if check.anomalies.is_empty() {
            continue;
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec!["Index", "Value", "Type", "Details"]);
        for anomaly in &check.anomalies {
            table.add_row(vec![
                anomaly.index_id.clone(),
                format!("{:.2}", anomaly.value),
                anomaly.anomaly_type.label().to_string(),
                anomaly.method_details.clone(),
            ]);
        }
        println!("{table}");
    }
}
