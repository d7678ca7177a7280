// vigil-core/src/domain/detection/series.rs

use chrono::{Datelike, NaiveDateTime};
use std::fmt;

use crate::domain::detection::mode::Frequency;

/// Identifier of a point: a timestamp for time series, a free-form label otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexId {
    Timestamp(NaiveDateTime),
    Label(String),
}

impl IndexId {
    /// Report rendering. Timestamps follow the bucket granularity:
    /// `YYYY-MM` monthly, `YYYY-Www` weekly (ISO week), `YYYY-MM-DD` otherwise.
    pub fn render(&self, frequency: Option<Frequency>) -> String {
        match self {
            IndexId::Label(label) => label.clone(),
            IndexId::Timestamp(ts) => match frequency {
                Some(Frequency::Monthly) => ts.format("%Y-%m").to_string(),
                Some(Frequency::Weekly) => {
                    let week = ts.iso_week();
                    format!("{}-W{:02}", week.year(), week.week())
                }
                _ => ts.format("%Y-%m-%d").to_string(),
            },
        }
    }
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub index_id: IndexId,
    pub value: f64,
    /// Parsed timestamp, present for time-based shapes only.
    pub date: Option<NaiveDateTime>,
}

/// Normalized `{index_id, value[, date]}` series consumed by the detectors.
/// Every value is finite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

impl FromIterator<SeriesPoint> for MetricSeries {
    fn from_iter<T: IntoIterator<Item = SeriesPoint>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
