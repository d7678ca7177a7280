// vigil-core/src/domain/detection/zscore.rs

use crate::domain::detection::outlier::{AnomalyType, Evidence, Outlier, OutlierDetector};
use crate::domain::detection::series::MetricSeries;

/// Relative spread below which a series is treated as constant.
const MIN_RELATIVE_STD: f64 = 1e-9;

/// Population mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
}

impl Moments {
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// True when the spread is rounding noise: `std <= 1e-9 * max(1, |mean|)`.
    pub fn is_degenerate(&self) -> bool {
        self.std_dev <= MIN_RELATIVE_STD * self.mean.abs().max(1.0)
    }

    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreDetector {
    pub threshold: f64,
}

impl ZScoreDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl OutlierDetector for ZScoreDetector {
    fn detect(&self, series: &MetricSeries) -> Vec<Outlier> {
        let values = series.values();
        let Some(moments) = Moments::compute(&values) else {
            return Vec::new();
        };
        // A constant series has no outliers under this method.
        let constant = values.iter().all(|v| *v == values[0]);
        if constant || moments.is_degenerate() {
            return Vec::new();
        }

        series
            .points()
            .iter()
            .enumerate()
            .filter_map(|(position, point)| {
                let z_score = moments.z_score(point.value);
                (z_score.abs() > self.threshold).then_some(Outlier {
                    position,
                    value: point.value,
                    anomaly_type: if z_score > 0.0 {
                        AnomalyType::Peak
                    } else {
                        AnomalyType::Valley
                    },
                    evidence: Evidence::ZScore { z_score },
                })
            })
            .collect()
    }

    fn limit_description(&self, _series: &MetricSeries) -> String {
        format!(
            "Z-Score Limit: > +/- {:.1} Standard Deviations",
            self.threshold
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::domain::detection::series::{IndexId, SeriesPoint};

    fn series(values: &[f64]) -> MetricSeries {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint {
                index_id: IndexId::Label(i.to_string()),
                value: *v,
                date: None,
            })
            .collect()
    }

    #[test]
    fn test_population_moments() {
        let m = Moments::compute(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(m.mean, 5.0);
        assert_eq!(m.std_dev, 2.0);
    }

    #[test]
    fn test_constant_series_has_no_outliers() {
        let s = series(&[42.0; 25]);
        assert!(ZScoreDetector::new(3.0).detect(&s).is_empty());
        assert!(ZScoreDetector::new(0.1).detect(&s).is_empty());
    }

    #[test]
    fn test_rounding_noise_is_not_spread() {
        // 0.1 is not representable: the computed std is ~1e-17, not 0.
        let s = series(&[0.1, 0.1, 0.1]);
        assert!(ZScoreDetector::new(0.5).detect(&s).is_empty());

        let m = Moments::compute(&[1e6 + 0.1; 7]).unwrap();
        assert!(m.is_degenerate());
        assert!(!Moments::compute(&[0.1, 0.2]).unwrap().is_degenerate());
    }

    #[test]
    fn test_extreme_points_flagged_both_ways() {
        let mut values = vec![10.0; 30];
        values[3] = 100.0;
        values[17] = -80.0;
        let s = series(&values);

        let outliers = ZScoreDetector::new(3.0).detect(&s);
        assert_eq!(outliers.len(), 2);

        let peak = outliers.iter().find(|o| o.position == 3).unwrap();
        assert_eq!(peak.anomaly_type, AnomalyType::Peak);
        assert!(peak.method_details().starts_with("Z-Score: "));

        let valley = outliers.iter().find(|o| o.position == 17).unwrap();
        assert_eq!(valley.anomaly_type, AnomalyType::Valley);
    }

    #[test]
    fn test_method_details_two_decimals() {
        let outlier = Outlier {
            position: 0,
            value: 1.0,
            anomaly_type: AnomalyType::Peak,
            evidence: Evidence::ZScore { z_score: 3.14159 },
        };
        assert_eq!(outlier.method_details(), "Z-Score: 3.14");
    }

    #[test]
    fn test_limit_description() {
        let s = series(&[1.0, 2.0]);
        assert_eq!(
            ZScoreDetector::new(3.0).limit_description(&s),
            "Z-Score Limit: > +/- 3.0 Standard Deviations"
        );
    }
}
