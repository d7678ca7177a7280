// vigil-core/src/domain/detection/prepare.rs

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::detection::mode::{Frequency, SeriesShape};
use crate::domain::detection::series::{IndexId, MetricSeries, SeriesPoint};
use crate::domain::error::DomainError;
use crate::domain::table::{Table, Value};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalizes a raw table into the series shape the detectors expect.
///
/// * `Distributional`: `{index_id, value}`, no sign filter, index kept as-is.
/// * `TimeAggregated(freq)`: values summed per bucket, ascending, non-positive buckets dropped.
/// * `TimeRaw`: `{index_id, value, date}` in row order, non-positive rows dropped.
///
/// Both columns are required in every shape. Null or non-finite values are skipped;
/// the caller's table is never modified.
pub fn prepare_series(
    table: &Table,
    value_col: &str,
    index_col: &str,
    shape: SeriesShape,
) -> Result<MetricSeries, DomainError> {
    let value_idx = table
        .column_index(value_col)
        .ok_or_else(|| DomainError::MissingColumn {
            column: value_col.to_string(),
            role: "Value".to_string(),
        })?;

    let index_idx = table
        .column_index(index_col)
        .ok_or_else(|| DomainError::MissingColumn {
            column: index_col.to_string(),
            role: "Index".to_string(),
        })?;

    if shape == SeriesShape::Distributional {
        return prepare_distributional(table, value_col, value_idx, index_idx);
    }

    let mut observations = Vec::with_capacity(table.len());
    for (row, cells) in table.rows().enumerate() {
        let Some(value) = numeric_value(&cells[value_idx], value_col, row)? else {
            continue;
        };
        let Some(ts) = timestamp_value(&cells[index_idx], index_col, row)? else {
            debug!(row, column = index_col, "Skipping row without timestamp");
            continue;
        };
        observations.push((ts, value));
    }

    let series = match shape {
        SeriesShape::TimeAggregated(freq) => aggregate(observations, freq),
        _ => observations
            .into_iter()
            .filter(|(_, value)| *value > 0.0)
            .map(|(ts, value)| SeriesPoint {
                index_id: IndexId::Timestamp(ts),
                value,
                date: Some(ts),
            })
            .collect(),
    };
    Ok(series)
}

fn prepare_distributional(
    table: &Table,
    value_col: &str,
    value_idx: usize,
    index_idx: usize,
) -> Result<MetricSeries, DomainError> {
    let mut points = Vec::with_capacity(table.len());
    for (row, cells) in table.rows().enumerate() {
        let Some(value) = numeric_value(&cells[value_idx], value_col, row)? else {
            continue;
        };
        let index_id = match &cells[index_idx] {
            Value::Timestamp(ts) => IndexId::Timestamp(*ts),
            other => IndexId::Label(other.to_string()),
        };
        points.push(SeriesPoint {
            index_id,
            value,
            date: None,
        });
    }
    Ok(MetricSeries::new(points))
}

fn aggregate(observations: Vec<(NaiveDateTime, f64)>, freq: Frequency) -> MetricSeries {
    let mut buckets: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();
    for (ts, value) in observations {
        *buckets.entry(freq.bucket_start(ts)).or_insert(0.0) += value;
    }

    buckets
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(start, total)| SeriesPoint {
            index_id: IndexId::Timestamp(start),
            value: total,
            date: Some(start),
        })
        .collect()
}

/// `Ok(None)` for cells that carry no usable number (null, NaN, infinities).
fn numeric_value(cell: &Value, column: &str, row: usize) -> Result<Option<f64>, DomainError> {
    let parsed = match cell {
        Value::Null => None,
        Value::Number(n) => Some(*n),
        Value::Text(s) => Some(s.trim().parse::<f64>().map_err(|_| {
            DomainError::InvalidValue {
                column: column.to_string(),
                row,
                value: s.clone(),
            }
        })?),
        Value::Timestamp(ts) => {
            return Err(DomainError::InvalidValue {
                column: column.to_string(),
                row,
                value: ts.to_string(),
            });
        }
    };
    Ok(parsed.filter(|v| v.is_finite()))
}

fn timestamp_value(
    cell: &Value,
    column: &str,
    row: usize,
) -> Result<Option<NaiveDateTime>, DomainError> {
    match cell {
        Value::Null => Ok(None),
        Value::Timestamp(ts) => Ok(Some(*ts)),
        Value::Text(s) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| DomainError::InvalidTimestamp {
                column: column.to_string(),
                row,
                value: s.clone(),
            }),
        Value::Number(n) => Err(DomainError::InvalidTimestamp {
            column: column.to_string(),
            row,
            value: n.to_string(),
        }),
    }
}

/// Accepts plain dates, naive datetimes (space or `T` separated) and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.naive_utc())
}
