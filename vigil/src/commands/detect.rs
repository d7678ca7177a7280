// vigil/src/commands/detect.rs
//
// USE CASE: Ad-hoc detection on the result of one SQL query.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use vigil_core::application::{DetectionRequest, perform_anomaly_detection};
use vigil_core::domain::detection::{AnalysisMode, Frequency, MethodKind};
use vigil_core::infrastructure::adapters::DuckDbSource;
use vigil_core::ports::source::TabularSource;

use super::print_report;

pub struct DetectArgs {
    pub query: String,
    pub value_col: String,
    pub index_col: String,
    pub mode: AnalysisMode,
    pub frequencies: Vec<Frequency>,
    pub method: MethodKind,
    pub iqr_factor: Option<f64>,
    pub z_threshold: Option<f64>,
    pub desc: String,
    pub db_path: String,
    pub output: Option<PathBuf>,
    pub registrations: Vec<(String, String)>,
}

pub async fn execute(args: DetectArgs) -> anyhow::Result<()> {
    let method = args.method.with_params(args.iqr_factor, args.z_threshold)?;

    let source = DuckDbSource::new(&args.db_path);
    for (name, path) in &args.registrations {
        source
            .register_source(name, path)
            .await
            .with_context(|| format!("Failed to register '{}' from {}", name, path))?;
        info!(view = %name, path = %path, "Source registered");
    }

    let table = source
        .fetch(&args.query)
        .await
        .context("❌ The query returned no data (see logs for the database error)")?;

    let mut request = DetectionRequest::new(args.value_col, args.index_col, args.mode, args.desc)
        .with_frequencies(args.frequencies)
        .with_method(method);
    if let Some(output) = args.output {
        request = request.with_output(output);
    }

    let report = perform_anomaly_detection(&table, &request)?;
    print_report(&report);

    if let Some(path) = &request.output_path {
        println!("\n💾 Report: {}", path.display());
    }
    Ok(())
}
