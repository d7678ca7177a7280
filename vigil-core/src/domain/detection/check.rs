// vigil-core/src/domain/detection/check.rs

use tracing::info;

use crate::domain::detection::iqr::IqrDetector;
use crate::domain::detection::mode::{AnalysisMode, DetectionMethod, Frequency};
use crate::domain::detection::outlier::OutlierDetector;
use crate::domain::detection::report::{AnomalyRecord, CheckContext, CheckReport};
use crate::domain::detection::series::MetricSeries;
use crate::domain::detection::zscore::ZScoreDetector;

impl DetectionMethod {
    pub fn detector(&self) -> Box<dyn OutlierDetector> {
        match *self {
            DetectionMethod::Iqr { factor } => Box::new(IqrDetector::new(factor)),
            DetectionMethod::ZScore { threshold } => Box::new(ZScoreDetector::new(threshold)),
        }
    }
}

/// Runs one detector over one prepared series and builds the check report.
///
/// Anomalies are listed by value, highest first; equal values keep series order.
/// Never fails: an empty series yields a zero-count report.
pub fn run_check(
    series: &MetricSeries,
    method: &DetectionMethod,
    mode: AnalysisMode,
    frequency: Option<Frequency>,
    metric_desc: &str,
) -> CheckReport {
    let ctx = CheckContext {
        analysis_mode: mode.label(),
        frequency: Frequency::label_of(frequency),
        metric_desc,
        method: method.label(),
    };

    if series.is_empty() {
        info!(
            metric = metric_desc,
            mode = ctx.analysis_mode,
            frequency = ctx.frequency,
            method = ctx.method,
            "Data is empty after preparation, skipping detection"
        );
        return CheckReport::empty(ctx);
    }

    let detector = method.detector();
    let mut outliers = detector.detect(series);
    let limit_description = detector.limit_description(series);

    info!(
        metric = metric_desc,
        mode = ctx.analysis_mode,
        frequency = ctx.frequency,
        method = ctx.method,
        total_points = series.len(),
        anomalies = outliers.len(),
        threshold = %limit_description,
        "Check completed"
    );

    outliers.sort_by(|a, b| b.value.total_cmp(&a.value));

    let points = series.points();
    let anomalies: Vec<AnomalyRecord> = outliers
        .iter()
        .map(|outlier| {
            let record = AnomalyRecord {
                index_id: points[outlier.position].index_id.render(frequency),
                value: outlier.value,
                anomaly_type: outlier.anomaly_type,
                method_details: outlier.method_details(),
            };
            info!(
                index = %record.index_id,
                kind = %record.anomaly_type,
                value = record.value,
                reason = %record.method_details,
                "Anomaly"
            );
            record
        })
        .collect();

    CheckReport::new(ctx, limit_description, series.len(), anomalies)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::detection::outlier::AnomalyType;
    use crate::domain::detection::report::EMPTY_DATA_LIMIT;
    use crate::domain::detection::series::{IndexId, SeriesPoint};
    use chrono::{NaiveDate, NaiveTime};

    fn labelled(values: &[f64]) -> MetricSeries {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint {
                index_id: IndexId::Label(format!("row-{}", i)),
                value: *v,
                date: None,
            })
            .collect()
    }

    #[test]
    fn test_empty_series_short_circuits() {
        let report = run_check(
            &MetricSeries::default(),
            &DetectionMethod::default(),
            AnalysisMode::TimeAggregated,
            Some(Frequency::Weekly),
            "Total Sales",
        );
        assert_eq!(report.total_points, 0);
        assert_eq!(report.anomaly_count, 0);
        assert!(report.anomalies.is_empty());
        assert_eq!(report.limit_description, EMPTY_DATA_LIMIT);
        assert_eq!(report.frequency, "Weekly");
        assert_eq!(report.method, "IQR");
    }

    #[test]
    fn test_anomalies_sorted_descending_with_stable_ties() {
        let mut values = vec![50.0; 20];
        values[2] = 400.0;
        values[5] = 900.0;
        values[9] = 400.0;
        values[14] = -300.0;

        let report = run_check(
            &labelled(&values),
            &DetectionMethod::default(),
            AnalysisMode::Distributional,
            None,
            "Delivery Duration in days",
        );

        let order: Vec<(&str, f64)> = report
            .anomalies
            .iter()
            .map(|a| (a.index_id.as_str(), a.value))
            .collect();
        assert_eq!(
            order,
            vec![
                ("row-5", 900.0),
                ("row-2", 400.0),
                ("row-9", 400.0),
                ("row-14", -300.0)
            ]
        );
        assert_eq!(report.anomaly_count, 4);
        assert_eq!(report.frequency, "N/A");
        assert_eq!(report.analysis_mode, "Distributional (Static)");
        assert_eq!(report.anomalies[3].anomaly_type, AnomalyType::Valley);
        assert_eq!(report.anomalies[3].method_details, "Breached Lower IQR Limit");
    }

    #[test]
    fn test_zscore_details_and_limit_text() {
        let mut values = vec![10.0; 30];
        values[0] = 100.0;
        let report = run_check(
            &labelled(&values),
            &DetectionMethod::z_score(3.0).unwrap(),
            AnalysisMode::TimeRaw,
            None,
            "Orders",
        );
        assert_eq!(report.method, "Z-Score");
        assert_eq!(
            report.limit_description,
            "Z-Score Limit: > +/- 3.0 Standard Deviations"
        );
        assert_eq!(report.anomaly_count, 1);
        assert!(report.anomalies[0].method_details.starts_with("Z-Score: 5.3"));
    }

    #[test]
    fn test_monthly_index_rendering() {
        let month = |m: u32| {
            NaiveDate::from_ymd_opt(2024, m, 1)
                .unwrap()
                .and_time(NaiveTime::MIN)
        };
        let mut points: Vec<SeriesPoint> = (1..=11)
            .map(|m| SeriesPoint {
                index_id: IndexId::Timestamp(month(m)),
                value: 100.0,
                date: Some(month(m)),
            })
            .collect();
        points.push(SeriesPoint {
            index_id: IndexId::Timestamp(month(12)),
            value: 5000.0,
            date: Some(month(12)),
        });

        let report = run_check(
            &MetricSeries::new(points),
            &DetectionMethod::default(),
            AnalysisMode::TimeAggregated,
            Some(Frequency::Monthly),
            "Total Sales",
        );
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].index_id, "2024-12");
    }
}
