// vigil-core/src/domain/detection/iqr.rs

use crate::domain::detection::outlier::{AnomalyType, Evidence, Outlier, OutlierDetector};
use crate::domain::detection::report::{EMPTY_DATA_LIMIT, format_amount};
use crate::domain::detection::series::MetricSeries;

/// Linear-interpolation quantile (the "inclusive" definition) over sorted data.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Tukey fences for one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn compute(values: &[f64], factor: f64) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - factor * iqr,
            upper: q3 + factor * iqr,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Strictly outside `[lower, upper]`.
    pub fn breached_by(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrDetector {
    pub factor: f64,
}

impl IqrDetector {
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    pub fn bounds(&self, series: &MetricSeries) -> Option<IqrBounds> {
        IqrBounds::compute(&series.values(), self.factor)
    }
}

impl OutlierDetector for IqrDetector {
    fn detect(&self, series: &MetricSeries) -> Vec<Outlier> {
        let Some(bounds) = self.bounds(series) else {
            return Vec::new();
        };

        series
            .points()
            .iter()
            .enumerate()
            .filter(|(_, point)| bounds.breached_by(point.value))
            .map(|(position, point)| Outlier {
                position,
                value: point.value,
                anomaly_type: if point.value > bounds.upper {
                    AnomalyType::Peak
                } else {
                    AnomalyType::Valley
                },
                evidence: Evidence::Iqr {
                    lower_limit: bounds.lower,
                    upper_limit: bounds.upper,
                },
            })
            .collect()
    }

    fn limit_description(&self, series: &MetricSeries) -> String {
        match self.bounds(series) {
            Some(b) => format!(
                "IQR Limits: {} to {}",
                format_amount(b.lower),
                format_amount(b.upper)
            ),
            None => EMPTY_DATA_LIMIT.to_string(),
        }
    }
}
