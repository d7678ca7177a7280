// vigil-core/src/application/catalog.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::application::anomaly::{DetectionRequest, perform_anomaly_detection};
use crate::domain::error::DomainError;
use crate::domain::table::Table;
use crate::error::VigilError;
use crate::infrastructure::config::catalog::RUN_RESULTS_FILE;
use crate::infrastructure::config::{CatalogConfig, MetricConfig};
use crate::infrastructure::fs::save_json;
use crate::ports::source::TabularSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricStatus {
    Completed {
        checks: usize,
        anomalies: usize,
        report_path: PathBuf,
    },
    Skipped {
        reason: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOutcome {
    pub metric: String,
    #[serde(flatten)]
    pub status: MetricStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRunSummary {
    pub outcomes: Vec<MetricOutcome>,
}

impl CatalogRunSummary {
    pub fn success(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|o| matches!(o.status, MetricStatus::Failed { .. }))
    }

    pub fn count(&self, pred: impl Fn(&MetricStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Runs every metric of the catalog against `source`, one after the other.
///
/// Each dataset is fetched at most once. A metric whose dataset is unavailable is
/// skipped; a metric whose detection fails is recorded and the run moves on.
#[instrument(skip_all, fields(catalog = %catalog.name, engine = source.engine_name()))]
pub async fn run_catalog(
    source: &dyn TabularSource,
    catalog: &CatalogConfig,
    project_dir: &Path,
    select: Option<&str>,
) -> Result<CatalogRunSummary, VigilError> {
    let metrics: Vec<&MetricConfig> = match select {
        Some(name) => {
            let selected: Vec<&MetricConfig> =
                catalog.metrics.iter().filter(|m| m.name == name).collect();
            if selected.is_empty() {
                return Err(DomainError::InvalidParameter(format!(
                    "Metric '{}' is not declared in catalog '{}'",
                    name, catalog.name
                ))
                .into());
            }
            selected
        }
        None => catalog.metrics.iter().collect(),
    };

    register_sources(source, catalog, project_dir).await?;

    let output_dir = project_dir.join(&catalog.output_dir);
    let mut tables: HashMap<&str, Option<Arc<Table>>> = HashMap::new();
    let mut summary = CatalogRunSummary::default();

    for metric in metrics {
        let table = match tables.get(metric.dataset.as_str()).cloned() {
            Some(cached) => cached,
            None => {
                let fetched = fetch_dataset(source, catalog, &metric.dataset).await;
                tables.insert(metric.dataset.as_str(), fetched.clone());
                fetched
            }
        };

        let status = match table {
            None => {
                warn!(metric = %metric.name, dataset = %metric.dataset, "No data, skipping metric");
                MetricStatus::Skipped {
                    reason: format!("dataset '{}' returned no data", metric.dataset),
                }
            }
            Some(table) => {
                let report_path = output_dir.join(metric.output_file());
                match run_metric(&table, metric, &report_path) {
                    Ok((checks, anomalies)) => MetricStatus::Completed {
                        checks,
                        anomalies,
                        report_path,
                    },
                    Err(e) => {
                        error!(metric = %metric.name, error = %e, "Anomaly detection failed");
                        MetricStatus::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            }
        };

        summary.outcomes.push(MetricOutcome {
            metric: metric.name.clone(),
            status,
        });
    }

    if let Err(e) = save_json(output_dir.join(RUN_RESULTS_FILE), &summary) {
        error!(error = %e, "Could not save run results");
    }

    info!(
        completed = summary.count(|s| matches!(s, MetricStatus::Completed { .. })),
        skipped = summary.count(|s| matches!(s, MetricStatus::Skipped { .. })),
        failed = summary.count(|s| matches!(s, MetricStatus::Failed { .. })),
        "Catalog run finished"
    );
    Ok(summary)
}

async fn register_sources(
    source: &dyn TabularSource,
    catalog: &CatalogConfig,
    project_dir: &Path,
) -> Result<(), VigilError> {
    for (name, raw_path) in &catalog.sources {
        let path = Path::new(raw_path);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_dir.join(path)
        };

        if absolute.exists() {
            source
                .register_source(name, &absolute.to_string_lossy())
                .await?;
            info!(source = %name, path = ?absolute, "Source registered");
        } else {
            warn!(source = %name, path = ?absolute, "Source file not found");
        }
    }
    Ok(())
}

async fn fetch_dataset(
    source: &dyn TabularSource,
    catalog: &CatalogConfig,
    dataset: &str,
) -> Option<Arc<Table>> {
    let query = catalog.datasets.get(dataset)?;
    info!(dataset, "Fetching dataset");
    source.fetch(query).await.map(Arc::new)
}

fn run_metric(
    table: &Table,
    metric: &MetricConfig,
    report_path: &Path,
) -> Result<(usize, usize), VigilError> {
    let request = DetectionRequest::new(
        &metric.value_column,
        &metric.index_column,
        metric.mode,
        &metric.description,
    )
    .with_frequencies(metric.frequencies.clone())
    .with_method(metric.detection_method()?)
    .with_output(report_path);

    let report = perform_anomaly_detection(table, &request)?;
    Ok((report.anomaly_checks.len(), report.total_anomalies()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::detection::FullReport;
    use crate::domain::table::Value;
    use crate::infrastructure::config::parse_catalog;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory source: known queries return a table, anything else is "no data".
    struct FakeSource {
        tables: HashMap<String, Table>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(tables: Vec<(&str, Table)>) -> Self {
            Self {
                tables: tables
                    .into_iter()
                    .map(|(q, t)| (q.to_string(), t))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TabularSource for FakeSource {
        async fn fetch(&self, query: &str) -> Option<Table> {
            self.calls.lock().unwrap().push(query.to_string());
            self.tables.get(query).cloned()
        }

        async fn register_source(&self, _name: &str, _path: &str) -> Result<(), VigilError> {
            Ok(())
        }

        fn engine_name(&self) -> &str {
            "fake"
        }
    }

    fn daily_orders() -> Table {
        let mut rows: Vec<Vec<Value>> = (1..=10)
            .map(|d| {
                vec![
                    format!("2024-01-{:02}", d).into(),
                    100.0.into(),
                    1000.0.into(),
                ]
            })
            .collect();
        rows.push(vec!["2024-01-11".into(), 500.0.into(), 1000.0.into()]);
        Table::from_rows(
            ["order_purchase_date", "total_daily_orders", "total_daily_revenue"],
            rows,
        )
        .unwrap()
    }

    const CATALOG: &str = r#"
name: olist
output_dir: reports
datasets:
  completed: "SELECT completed"
  canceled: "SELECT canceled"
metrics:
  - name: sales
    dataset: completed
    description: Total Sales
    value_column: total_daily_revenue
    index_column: order_purchase_date
    mode: TIME_RAW
  - name: successful_orders
    dataset: completed
    description: Total Successful Orders
    value_column: total_daily_orders
    index_column: order_purchase_date
    mode: TIME_RAW
  - name: order_cancellations
    dataset: canceled
    description: Total Order Cancellations
    value_column: total_daily_orders
    index_column: order_purchase_date
    mode: TIME_AGGREGATED
  - name: broken
    dataset: completed
    description: Broken metric
    value_column: not_a_column
    index_column: order_purchase_date
    mode: TIME_RAW
"#;

    #[tokio::test]
    async fn test_catalog_isolates_metric_failures() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let catalog = parse_catalog(CATALOG)?;
        let source = FakeSource::new(vec![("SELECT completed", daily_orders())]);

        let summary = run_catalog(&source, &catalog, dir.path(), None).await?;

        let statuses: Vec<(&str, &MetricStatus)> = summary
            .outcomes
            .iter()
            .map(|o| (o.metric.as_str(), &o.status))
            .collect();
        assert_eq!(statuses.len(), 4);
        assert!(matches!(statuses[0].1, MetricStatus::Completed { anomalies: 0, .. }));
        assert!(matches!(statuses[1].1, MetricStatus::Completed { anomalies: 1, .. }));
        assert!(matches!(statuses[2].1, MetricStatus::Skipped { .. }));
        assert!(matches!(statuses[3].1, MetricStatus::Failed { .. }));
        assert!(!summary.success());

        // The shared dataset is fetched once.
        assert_eq!(source.calls(), vec!["SELECT completed", "SELECT canceled"]);

        let report: FullReport = serde_json::from_str(&std::fs::read_to_string(
            dir.path().join("reports/successful_orders.json"),
        )?)?;
        assert_eq!(report.pipeline_run_details.metric_desc, "Total Successful Orders");
        assert_eq!(report.anomaly_checks[0].anomalies[0].index_id, "2024-01-11");

        assert!(dir.path().join("reports/run_results.json").exists());
        assert!(!dir.path().join("reports/broken.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_select_runs_single_metric() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let catalog = parse_catalog(CATALOG)?;
        let source = FakeSource::new(vec![("SELECT completed", daily_orders())]);

        let summary = run_catalog(&source, &catalog, dir.path(), Some("sales")).await?;
        assert_eq!(summary.outcomes.len(), 1);
        assert!(summary.success());

        let res = run_catalog(&source, &catalog, dir.path(), Some("unknown")).await;
        assert!(matches!(
            res,
            Err(VigilError::Domain(DomainError::InvalidParameter(_)))
        ));
        Ok(())
    }

    #[test]
    fn test_outcome_serialization() -> Result<()> {
        let outcome = MetricOutcome {
            metric: "sales".into(),
            status: MetricStatus::Skipped {
                reason: "no data".into(),
            },
        };
        let json = serde_json::to_value(&outcome)?;
        assert_eq!(
            json,
            serde_json::json!({ "metric": "sales", "status": "skipped", "reason": "no data" })
        );
        Ok(())
    }
}
