// vigil/src/commands/run.rs
//
// USE CASE: Run every metric of the catalog.

use std::path::{Path, PathBuf};

use anyhow::Context;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use vigil_core::application::{CatalogRunSummary, MetricStatus, run_catalog};
use vigil_core::infrastructure::adapters::DuckDbSource;
use vigil_core::infrastructure::config::load_catalog;

pub async fn execute(project_dir: PathBuf, select: Option<String>) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    // A. Load the catalog (Infra)
    println!("⚙️  Loading metric catalog...");
    let catalog = load_catalog(&project_dir).with_context(|| {
        format!("Failed to load metric catalog from {:?}", project_dir)
    })?;
    println!(
        "   Catalog: {} ({} metrics)",
        catalog.name,
        catalog.metrics.len()
    );

    // B. Data source. File databases are resolved against the project dir.
    let db_path = resolve_db_path(&project_dir, &catalog.database);
    println!("   Engine: DuckDB 🦆 ({})", db_path);
    let source = DuckDbSource::new(db_path);

    // C. Run the catalog (Application Layer)
    let result = run_catalog(&source, &catalog, &project_dir, select.as_deref()).await;

    match result {
        Ok(summary) => {
            print_summary(&summary);
            if summary.success() {
                println!("\n✨ SUCCESS! Catalog finished in {:.2?}", start.elapsed());
            } else {
                let failed = summary.count(|s| matches!(s, MetricStatus::Failed { .. }));
                eprintln!("\n❌ FAILURE. {} metrics failed.", failed);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL CATALOG ERROR: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn resolve_db_path(project_dir: &Path, database: &str) -> String {
    if database == ":memory:" || Path::new(database).is_absolute() {
        database.to_string()
    } else {
        project_dir.join(database).to_string_lossy().into_owned()
    }
}

fn print_summary(summary: &CatalogRunSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Status", "Checks", "Anomalies", "Details"]);

    for outcome in &summary.outcomes {
        let row = match &outcome.status {
            MetricStatus::Completed {
                checks,
                anomalies,
                report_path,
            } => vec![
                outcome.metric.clone(),
                "✅ completed".to_string(),
                checks.to_string(),
                anomalies.to_string(),
                report_path.display().to_string(),
            ],
            MetricStatus::Skipped { reason } => vec![
                outcome.metric.clone(),
                "⏭️  skipped".to_string(),
                "-".to_string(),
                "-".to_string(),
                reason.clone(),
            ],
            MetricStatus::Failed { error } => vec![
                outcome.metric.clone(),
                "❌ failed".to_string(),
                "-".to_string(),
                "-".to_string(),
                error.clone(),
            ],
        };
        table.add_row(row);
    }
    println!("\n{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_db_path() {
        let root = Path::new("/srv/project");
        assert_eq!(resolve_db_path(root, ":memory:"), ":memory:");
        assert_eq!(resolve_db_path(root, "/data/wh.duckdb"), "/data/wh.duckdb");
        assert_eq!(
            resolve_db_path(root, "wh.duckdb"),
            "/srv/project/wh.duckdb"
        );
    }
}
