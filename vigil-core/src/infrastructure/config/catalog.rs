// vigil-core/src/infrastructure/config/catalog.rs

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use crate::domain::detection::{AnalysisMode, DetectionMethod, Frequency, MethodKind};
use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;

const CATALOG_FILES: [&str; 2] = ["vigil.yaml", "vigil.yml"];

/// Run summary written next to the metric reports; no metric may claim it.
pub const RUN_RESULTS_FILE: &str = "run_results.json";

/// The list of business metrics a run checks, and where their data comes from.
#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
#[validate(schema(function = "validate_catalog"))]
pub struct CatalogConfig {
    #[validate(length(min = 1, message = "Catalog name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// View name -> file path, registered before any dataset is fetched.
    #[serde(default)]
    pub sources: BTreeMap<String, String>,

    /// Dataset name -> SQL query. A dataset is fetched once per run.
    #[serde(default)]
    pub datasets: BTreeMap<String, String>,

    #[validate(nested)]
    #[validate(length(min = 1, message = "At least one metric is required"))]
    pub metrics: Vec<MetricConfig>,
}

#[derive(Debug, Deserialize, Serialize, Validate, Clone)]
pub struct MetricConfig {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    #[validate(length(min = 1))]
    pub dataset: String,

    pub description: String,
    pub value_column: String,
    pub index_column: String,
    pub mode: AnalysisMode,

    #[serde(default = "default_frequencies")]
    pub frequencies: Vec<Frequency>,

    #[serde(default)]
    pub method: MethodKind,

    #[validate(range(exclusive_min = 0.0))]
    pub iqr_factor: Option<f64>,

    #[validate(range(exclusive_min = 0.0))]
    pub z_threshold: Option<f64>,

    /// Report file, relative to the catalog output directory.
    pub output: Option<String>,
}

impl MetricConfig {
    pub fn detection_method(&self) -> Result<DetectionMethod, DomainError> {
        self.method.with_params(self.iqr_factor, self.z_threshold)
    }

    pub fn output_file(&self) -> PathBuf {
        self.output
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("{}.json", self.name)))
    }
}

fn default_database() -> String {
    ":memory:".to_string()
}
fn default_output_dir() -> String {
    "output/anomaly_detection".to_string()
}
fn default_frequencies() -> Vec<Frequency> {
    vec![Frequency::Daily, Frequency::Weekly]
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    let mut outputs = HashSet::new();
    for metric in &catalog.metrics {
        if !names.insert(metric.name.as_str()) {
            return Err(catalog_error(
                "duplicate_metric",
                format!("Metric '{}' is declared more than once", metric.name),
            ));
        }
        if !catalog.datasets.contains_key(&metric.dataset) {
            return Err(catalog_error(
                "unknown_dataset",
                format!(
                    "Metric '{}' refers to undeclared dataset '{}'",
                    metric.name, metric.dataset
                ),
            ));
        }

        let output = normalize_output(&metric.output_file());
        if output == Path::new(RUN_RESULTS_FILE) {
            return Err(catalog_error(
                "reserved_output",
                format!(
                    "Metric '{}' cannot write its report to '{}'",
                    metric.name, RUN_RESULTS_FILE
                ),
            ));
        }
        if !outputs.insert(output) {
            return Err(catalog_error(
                "duplicate_output",
                format!(
                    "Metric '{}' writes to a report path already used by another metric",
                    metric.name
                ),
            ));
        }
    }
    Ok(())
}

/// Drops `.` segments so `./a.json` and `a.json` compare equal.
fn normalize_output(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn catalog_error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::from(message));
    err
}

// --- LOADER ---

#[instrument(skip(project_dir))]
pub fn load_catalog(project_dir: &Path) -> Result<CatalogConfig, InfrastructureError> {
    let path = find_catalog_file(project_dir)?;
    info!(path = ?path, "Loading metric catalog");

    let content = fs::read_to_string(&path)?;
    let mut catalog = parse_catalog(&content)?;

    // Layering: VIGIL_OUTPUT_DIR=/tmp/reports vigil run
    apply_env_overrides(&mut catalog, |key| std::env::var(key).ok());

    info!(metrics = catalog.metrics.len(), "Metric catalog loaded");
    Ok(catalog)
}

/// Parses and validates catalog YAML.
pub fn parse_catalog(content: &str) -> Result<CatalogConfig, InfrastructureError> {
    let catalog: CatalogConfig = serde_yaml::from_str(content)?;
    catalog.validate()?;
    Ok(catalog)
}

fn find_catalog_file(root: &Path) -> Result<PathBuf, InfrastructureError> {
    CATALOG_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
        .ok_or_else(|| {
            InfrastructureError::ConfigNotFound(format!(
                "{:?} (checked: {:?})",
                root, CATALOG_FILES
            ))
        })
}

fn apply_env_overrides(catalog: &mut CatalogConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("VIGIL_OUTPUT_DIR") {
        info!(old = ?catalog.output_dir, new = ?val, "Overriding output dir via ENV");
        catalog.output_dir = val;
    }
    if let Some(val) = lookup("VIGIL_DATABASE") {
        info!(old = ?catalog.database, new = ?val, "Overriding database via ENV");
        catalog.database = val;
    }
}
