// vigil-core/src/domain/detection/outlier.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::detection::series::MetricSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyType {
    #[serde(rename = "Peak (High)")]
    Peak,
    #[serde(rename = "Valley (Low)")]
    Valley,
}

impl AnomalyType {
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyType::Peak => "Peak (High)",
            AnomalyType::Valley => "Valley (Low)",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Method-specific fields attached to a flagged point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evidence {
    Iqr { lower_limit: f64, upper_limit: f64 },
    ZScore { z_score: f64 },
}

/// One flagged point. `position` indexes into the series the detector was given.
#[derive(Debug, Clone, PartialEq)]
pub struct Outlier {
    pub position: usize,
    pub value: f64,
    pub anomaly_type: AnomalyType,
    pub evidence: Evidence,
}

impl Outlier {
    pub fn method(&self) -> &'static str {
        match self.evidence {
            Evidence::Iqr { .. } => "IQR",
            Evidence::ZScore { .. } => "Z-Score",
        }
    }

    /// Reason string written next to the anomaly in reports.
    pub fn method_details(&self) -> String {
        match (self.evidence, self.anomaly_type) {
            (Evidence::Iqr { .. }, AnomalyType::Peak) => "Breached Upper IQR Limit".to_string(),
            (Evidence::Iqr { .. }, AnomalyType::Valley) => "Breached Lower IQR Limit".to_string(),
            (Evidence::ZScore { z_score }, _) => format!("Z-Score: {:.2}", z_score),
        }
    }
}

/// A stateless statistical detector. Implementations only read the series.
pub trait OutlierDetector {
    fn detect(&self, series: &MetricSeries) -> Vec<Outlier>;

    /// Human-readable description of the limits `detect` applies to this series.
    fn limit_description(&self, series: &MetricSeries) -> String;
}
