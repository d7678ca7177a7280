// vigil-core/src/application/mod.rs

pub mod anomaly;
pub mod catalog;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use vigil_core::application::{run_catalog, perform_anomaly_detection};`

pub use anomaly::{DetectionRequest, perform_anomaly_detection};
pub use catalog::{CatalogRunSummary, MetricOutcome, MetricStatus, run_catalog};
