// vigil-core/src/domain/detection/mode.rs

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

pub const DEFAULT_IQR_FACTOR: f64 = 1.5;
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// How a metric is looked at: as a time series (bucketed or raw) or as a static distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnalysisMode {
    TimeAggregated,
    TimeRaw,
    Distributional,
}

impl AnalysisMode {
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisMode::TimeAggregated => "TIME_AGGREGATED",
            AnalysisMode::TimeRaw => "TIME_RAW",
            AnalysisMode::Distributional => "DISTRIBUTIONAL",
        }
    }

    /// Human-readable name written into reports.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMode::TimeAggregated | AnalysisMode::TimeRaw => "Time-Series",
            AnalysisMode::Distributional => "Distributional (Static)",
        }
    }

    /// Resolves the concrete series shape the preparer must build.
    /// An aggregated mode without a frequency is read as raw time data.
    pub fn shape(&self, frequency: Option<Frequency>) -> SeriesShape {
        match (self, frequency) {
            (AnalysisMode::TimeAggregated, Some(freq)) => SeriesShape::TimeAggregated(freq),
            (AnalysisMode::TimeAggregated, None) | (AnalysisMode::TimeRaw, _) => {
                SeriesShape::TimeRaw
            }
            (AnalysisMode::Distributional, _) => SeriesShape::Distributional,
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for AnalysisMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TIME_AGGREGATED" => Ok(AnalysisMode::TimeAggregated),
            "TIME_RAW" => Ok(AnalysisMode::TimeRaw),
            "DISTRIBUTIONAL" => Ok(AnalysisMode::Distributional),
            _ => Err(DomainError::UnknownMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for AnalysisMode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnalysisMode> for String {
    fn from(mode: AnalysisMode) -> Self {
        mode.code().to_string()
    }
}

/// The three canonical shapes a prepared series can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesShape {
    Distributional,
    TimeAggregated(Frequency),
    TimeRaw,
}

/// Bucket width used when summing a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn code(&self) -> &'static str {
        match self {
            Frequency::Daily => "D",
            Frequency::Weekly => "W",
            Frequency::Monthly => "M",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
        }
    }

    /// Label for an optional frequency, "N/A" when the check is not bucketed.
    pub fn label_of(frequency: Option<Frequency>) -> &'static str {
        frequency.map_or("N/A", |f| f.label())
    }

    /// Start of the bucket containing `ts`: midnight, Monday of the week, or first of the month.
    pub fn bucket_start(&self, ts: NaiveDateTime) -> NaiveDateTime {
        let date = ts.date();
        let start = match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Frequency::Monthly => date - Duration::days(i64::from(date.day0())),
        };
        start.and_time(NaiveTime::MIN)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "D" | "DAILY" => Ok(Frequency::Daily),
            "W" | "WEEKLY" => Ok(Frequency::Weekly),
            "M" | "MONTHLY" => Ok(Frequency::Monthly),
            _ => Err(DomainError::UnknownFrequency(s.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(freq: Frequency) -> Self {
        freq.code().to_string()
    }
}

/// Detection method name, as written in configuration files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MethodKind {
    #[default]
    Iqr,
    ZScore,
}

impl MethodKind {
    pub fn label(&self) -> &'static str {
        match self {
            MethodKind::Iqr => "IQR",
            MethodKind::ZScore => "Z-Score",
        }
    }

    /// Attaches tuning parameters, falling back to the defaults (1.5 and 3.0).
    pub fn with_params(
        self,
        iqr_factor: Option<f64>,
        z_threshold: Option<f64>,
    ) -> Result<DetectionMethod, DomainError> {
        match self {
            MethodKind::Iqr => DetectionMethod::iqr(iqr_factor.unwrap_or(DEFAULT_IQR_FACTOR)),
            MethodKind::ZScore => {
                DetectionMethod::z_score(z_threshold.unwrap_or(DEFAULT_Z_THRESHOLD))
            }
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MethodKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "IQR" => Ok(MethodKind::Iqr),
            "Z-SCORE" | "ZSCORE" | "Z_SCORE" | "Z" => Ok(MethodKind::ZScore),
            _ => Err(DomainError::UnknownMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for MethodKind {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MethodKind> for String {
    fn from(kind: MethodKind) -> Self {
        kind.label().to_string()
    }
}

/// A detection method together with its tuning parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionMethod {
    Iqr { factor: f64 },
    ZScore { threshold: f64 },
}

impl DetectionMethod {
    pub fn iqr(factor: f64) -> Result<Self, DomainError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(DomainError::InvalidParameter(format!(
                "IQR factor must be a positive number, got {}",
                factor
            )));
        }
        Ok(DetectionMethod::Iqr { factor })
    }

    pub fn z_score(threshold: f64) -> Result<Self, DomainError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(DomainError::InvalidParameter(format!(
                "Z-Score threshold must be a positive number, got {}",
                threshold
            )));
        }
        Ok(DetectionMethod::ZScore { threshold })
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            DetectionMethod::Iqr { .. } => MethodKind::Iqr,
            DetectionMethod::ZScore { .. } => MethodKind::ZScore,
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind().label()
    }
}

impl Default for DetectionMethod {
    fn default() -> Self {
        DetectionMethod::Iqr {
            factor: DEFAULT_IQR_FACTOR,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap()
    }

    #[test]
    fn test_mode_parsing_is_case_insensitive() -> Result<()> {
        assert_eq!(
            "time_aggregated".parse::<AnalysisMode>()?,
            AnalysisMode::TimeAggregated
        );
        assert_eq!(" Time_Raw ".parse::<AnalysisMode>()?, AnalysisMode::TimeRaw);
        assert!(matches!(
            "HOURLY".parse::<AnalysisMode>(),
            Err(DomainError::UnknownMode(_))
        ));
        Ok(())
    }

    #[test]
    fn test_aggregated_without_frequency_is_raw() {
        assert_eq!(AnalysisMode::TimeAggregated.shape(None), SeriesShape::TimeRaw);
        assert_eq!(
            AnalysisMode::TimeAggregated.shape(Some(Frequency::Weekly)),
            SeriesShape::TimeAggregated(Frequency::Weekly)
        );
        assert_eq!(
            AnalysisMode::Distributional.shape(Some(Frequency::Daily)),
            SeriesShape::Distributional
        );
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_bucket_starts() {
        // 2024-03-14 is a Thursday
        let ts = at(2024, 3, 14);
        assert_eq!(Frequency::Daily.bucket_start(ts), midnight(2024, 3, 14));
        assert_eq!(Frequency::Weekly.bucket_start(ts), midnight(2024, 3, 11));
        assert_eq!(Frequency::Monthly.bucket_start(ts), midnight(2024, 3, 1));
    }

    #[test]
    fn test_method_labels_and_params() -> Result<()> {
        assert_eq!("z-score".parse::<MethodKind>()?, MethodKind::ZScore);
        assert_eq!(MethodKind::ZScore.label(), "Z-Score");

        let method = MethodKind::Iqr.with_params(None, Some(9.0))?;
        assert_eq!(method, DetectionMethod::Iqr { factor: 1.5 });

        assert!(MethodKind::ZScore.with_params(None, Some(-1.0)).is_err());
        Ok(())
    }

    #[test]
    fn test_frequency_serde_uses_codes() -> Result<()> {
        let freqs: Vec<Frequency> = serde_json::from_str(r#"["D", "w", "Monthly"]"#)?;
        assert_eq!(
            freqs,
            vec![Frequency::Daily, Frequency::Weekly, Frequency::Monthly]
        );
        assert_eq!(serde_json::to_string(&freqs)?, r#"["D","W","M"]"#);
        Ok(())
    }
}
