// vigil-core/src/domain/detection/report.rs

use serde::{Deserialize, Serialize};

use crate::domain::detection::outlier::AnomalyType;

pub const EMPTY_DATA_LIMIT: &str = "N/A - Empty Data";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub index_id: String,
    pub value: f64,
    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub method_details: String,
}

/// Outcome of one detector run over one prepared series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub analysis_mode: String,
    pub frequency: String,
    pub metric_desc: String,
    pub method: String,
    pub limit_description: String,
    pub total_points: usize,
    pub anomaly_count: usize,
    pub anomalies: Vec<AnomalyRecord>,
}

/// Labels shared by every check of a run.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub analysis_mode: &'a str,
    pub frequency: &'a str,
    pub metric_desc: &'a str,
    pub method: &'a str,
}

impl CheckReport {
    /// Builds a report; `anomaly_count` is always derived from `anomalies`.
    pub fn new(
        ctx: CheckContext<'_>,
        limit_description: String,
        total_points: usize,
        anomalies: Vec<AnomalyRecord>,
    ) -> Self {
        Self {
            analysis_mode: ctx.analysis_mode.to_string(),
            frequency: ctx.frequency.to_string(),
            metric_desc: ctx.metric_desc.to_string(),
            method: ctx.method.to_string(),
            limit_description,
            total_points,
            anomaly_count: anomalies.len(),
            anomalies,
        }
    }

    pub fn empty(ctx: CheckContext<'_>) -> Self {
        Self::new(ctx, EMPTY_DATA_LIMIT.to_string(), 0, Vec::new())
    }

    /// Entry used in `checks_run`, e.g. "Weekly (Time-Series)".
    pub fn check_label(&self) -> String {
        format!("{} ({})", self.frequency, self.analysis_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRunDetails {
    pub metric_desc: String,
    pub method: String,
    pub analysis_mode: String,
    pub checks_run: Vec<String>,
}

/// Everything one pipeline invocation produced for a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullReport {
    pub pipeline_run_details: PipelineRunDetails,
    pub anomaly_checks: Vec<CheckReport>,
}

impl FullReport {
    pub fn new(metric_desc: &str, method: &str, analysis_mode: &str, checks: Vec<CheckReport>) -> Self {
        Self {
            pipeline_run_details: PipelineRunDetails {
                metric_desc: metric_desc.to_string(),
                method: method.to_string(),
                analysis_mode: analysis_mode.to_string(),
                checks_run: checks.iter().map(CheckReport::check_label).collect(),
            },
            anomaly_checks: checks,
        }
    }

    pub fn total_anomalies(&self) -> usize {
        self.anomaly_checks.iter().map(|c| c.anomaly_count).sum()
    }
}

/// Two decimals with thousands separators: `-1234.5` -> `-1,234.50`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rendered = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    if value < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn ctx() -> CheckContext<'static> {
        CheckContext {
            analysis_mode: "Time-Series",
            frequency: "Daily",
            metric_desc: "Total Sales",
            method: "IQR",
        }
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1234567.891), "1,234,567.89");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
        assert_eq!(format_amount(12.0), "12.00");
    }

    #[test]
    fn test_count_follows_anomalies() {
        let report = CheckReport::new(
            ctx(),
            "IQR Limits: 1.00 to 2.00".into(),
            12,
            vec![AnomalyRecord {
                index_id: "2024-01-11".into(),
                value: 500.0,
                anomaly_type: AnomalyType::Peak,
                method_details: "Breached Upper IQR Limit".into(),
            }],
        );
        assert_eq!(report.anomaly_count, report.anomalies.len());
        assert_eq!(report.check_label(), "Daily (Time-Series)");
    }

    #[test]
    fn test_json_shape() -> Result<()> {
        let full = FullReport::new("Total Sales", "IQR", "Time-Series", vec![CheckReport::empty(ctx())]);
        let json = serde_json::to_value(&full)?;

        assert_eq!(json["pipeline_run_details"]["checks_run"][0], "Daily (Time-Series)");
        assert_eq!(json["anomaly_checks"][0]["limit_description"], "N/A - Empty Data");
        assert_eq!(json["anomaly_checks"][0]["total_points"], 0);

        let record = AnomalyRecord {
            index_id: "x".into(),
            value: 1.5,
            anomaly_type: AnomalyType::Valley,
            method_details: "Breached Lower IQR Limit".into(),
        };
        let json = serde_json::to_value(&record)?;
        assert_eq!(json["type"], "Valley (Low)");
        Ok(())
    }
}
