// vigil-core/src/domain/detection/mod.rs

pub mod check;
pub mod iqr;
pub mod mode;
pub mod outlier;
pub mod prepare;
pub mod report;
pub mod series;
pub mod zscore;

pub use check::run_check;
pub use mode::{AnalysisMode, DetectionMethod, Frequency, MethodKind, SeriesShape};
pub use outlier::{AnomalyType, Outlier, OutlierDetector};
pub use prepare::prepare_series;
pub use report::{AnomalyRecord, CheckReport, FullReport, PipelineRunDetails};
pub use series::{IndexId, MetricSeries, SeriesPoint};
