// vigil-core/src/application/anomaly.rs

use std::path::PathBuf;
use tracing::{error, info, instrument};

use crate::domain::detection::{
    AnalysisMode, CheckReport, DetectionMethod, Frequency, FullReport, prepare_series, run_check,
};
use crate::domain::error::DomainError;
use crate::domain::table::Table;
use crate::error::VigilError;
use crate::infrastructure::fs::save_json;

/// Parameters of one pipeline invocation for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub value_col: String,
    pub index_col: String,
    pub mode: AnalysisMode,
    pub metric_desc: String,
    /// Only read in `TimeAggregated` mode.
    pub frequencies: Vec<Frequency>,
    pub method: DetectionMethod,
    pub output_path: Option<PathBuf>,
}

impl DetectionRequest {
    /// Defaults: daily and weekly frequencies, IQR with factor 1.5, nothing persisted.
    pub fn new(
        value_col: impl Into<String>,
        index_col: impl Into<String>,
        mode: AnalysisMode,
        metric_desc: impl Into<String>,
    ) -> Self {
        Self {
            value_col: value_col.into(),
            index_col: index_col.into(),
            mode,
            metric_desc: metric_desc.into(),
            frequencies: vec![Frequency::Daily, Frequency::Weekly],
            method: DetectionMethod::default(),
            output_path: None,
        }
    }

    pub fn with_frequencies(mut self, frequencies: Vec<Frequency>) -> Self {
        self.frequencies = frequencies;
        self
    }

    pub fn with_method(mut self, method: DetectionMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Runs detection for one metric and assembles the full report.
///
/// Aggregated mode runs one check per frequency; raw and distributional modes run one
/// check. Configuration errors surface before any file is written. When an output
/// path is set the report is persisted best-effort: a write failure is logged and
/// the report is still returned.
#[instrument(skip(table, request), fields(metric = %request.metric_desc, mode = %request.mode))]
pub fn perform_anomaly_detection(
    table: &Table,
    request: &DetectionRequest,
) -> Result<FullReport, VigilError> {
    info!(rows = table.len(), method = request.method.label(), "*** Anomaly Detection Analysis ***");

    let checks = match request.mode {
        AnalysisMode::TimeAggregated => {
            if request.frequencies.is_empty() {
                return Err(DomainError::EmptyFrequencies.into());
            }
            request
                .frequencies
                .iter()
                .map(|freq| run_single(table, request, Some(*freq)))
                .collect::<Result<Vec<_>, _>>()?
        }
        AnalysisMode::TimeRaw | AnalysisMode::Distributional => {
            vec![run_single(table, request, None)?]
        }
    };

    let report = FullReport::new(
        &request.metric_desc,
        request.method.label(),
        request.mode.label(),
        checks,
    );

    if let Some(path) = &request.output_path {
        match save_json(path, &report) {
            Ok(()) => info!(path = ?path, "Successfully saved anomaly report"),
            Err(e) => error!(path = ?path, error = %e, "Could not save anomaly report"),
        }
    }

    Ok(report)
}

fn run_single(
    table: &Table,
    request: &DetectionRequest,
    frequency: Option<Frequency>,
) -> Result<CheckReport, VigilError> {
    let series = prepare_series(
        table,
        &request.value_col,
        &request.index_col,
        request.mode.shape(frequency),
    )?;
    Ok(run_check(
        &series,
        &request.method,
        request.mode,
        frequency,
        &request.metric_desc,
    ))
}
