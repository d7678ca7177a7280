// vigil-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::DateTime;
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::{Config, Connection};
use std::sync::Mutex;
use tracing::{error, info, instrument};

// Hexagonal imports
use crate::domain::table::{Table, Value};
use crate::error::VigilError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::source::TabularSource;

const QUERY_SNIPPET_CHARS: usize = 100;

/// DuckDB-backed data source. The connection is opened on first use and owned
/// by this handle, so each caller decides which database it talks to.
pub struct DuckDbSource {
    db_path: String,
    conn: Mutex<Option<Connection>>,
}

impl DuckDbSource {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            conn: Mutex::new(None),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn open(db_path: &str) -> Result<Connection, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };
        info!(path = db_path, "DuckDB connection initialized");
        Ok(conn)
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, InfrastructureError>,
    ) -> Result<T, InfrastructureError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| InfrastructureError::Io(std::io::Error::other("DuckDB Mutex Poisoned")))?;

        if guard.is_none() {
            *guard = Some(Self::open(&self.db_path)?);
        }
        let conn = guard
            .as_ref()
            .ok_or_else(|| InfrastructureError::ConfigError("DuckDB connection unavailable".into()))?;
        f(conn)
    }

    /// Runs one or more statements that return no rows.
    pub fn execute(&self, sql: &str) -> Result<(), InfrastructureError> {
        self.with_connection(|conn| conn.execute_batch(sql).map_err(Into::into))
    }

    /// Runs a query and materializes the full result as a [`Table`].
    pub fn query_table(&self, sql: &str) -> Result<Table, InfrastructureError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([])?;

            let columns: Vec<String> = rows.as_ref().map(|s| s.column_names()).unwrap_or_default();
            let width = columns.len();
            let mut table = Table::new(columns);

            while let Some(row) = rows.next()? {
                let mut cells = Vec::with_capacity(width);
                for i in 0..width {
                    cells.push(to_value(row.get_ref(i)?));
                }
                table
                    .push_row(cells)
                    .map_err(|e| InfrastructureError::Decode(e.to_string()))?;
            }
            Ok(table)
        })
    }
}

#[async_trait]
impl TabularSource for DuckDbSource {
    #[instrument(skip(self, query), fields(engine = "duckdb"))]
    async fn fetch(&self, query: &str) -> Option<Table> {
        match self.query_table(query) {
            Ok(table) => {
                info!(rows = table.len(), columns = table.columns().len(), "Query successful");
                Some(table)
            }
            Err(e) => {
                error!(error = %e, query = %snippet(query), "Query failed");
                None
            }
        }
    }

    async fn register_source(&self, name: &str, path: &str) -> Result<(), VigilError> {
        let reader = if path.to_lowercase().ends_with(".parquet") {
            "read_parquet"
        } else {
            "read_csv_auto"
        };
        let query = format!(
            "CREATE OR REPLACE VIEW \"{}\" AS SELECT * FROM {}('{}')",
            name.replace('"', "\"\""),
            reader,
            path.replace('\'', "''")
        );
        self.execute(&query).map_err(VigilError::Infrastructure)
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

fn snippet(query: &str) -> String {
    let flat = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > QUERY_SNIPPET_CHARS {
        let head: String = flat.chars().take(QUERY_SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

fn micros(unit: TimeUnit, raw: i64) -> i64 {
    match unit {
        TimeUnit::Second => raw.saturating_mul(1_000_000),
        TimeUnit::Millisecond => raw.saturating_mul(1_000),
        TimeUnit::Microsecond => raw,
        TimeUnit::Nanosecond => raw / 1_000,
    }
}

fn from_micros(us: i64) -> Value {
    DateTime::from_timestamp_micros(us)
        .map(|dt| Value::Timestamp(dt.naive_utc()))
        .unwrap_or(Value::Null)
}

fn from_days(days: i32) -> Value {
    DateTime::from_timestamp(i64::from(days) * 86_400, 0)
        .map(|dt| Value::Timestamp(dt.naive_utc()))
        .unwrap_or(Value::Null)
}

fn to_value(raw: ValueRef<'_>) -> Value {
    match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Number(if b { 1.0 } else { 0.0 }),
        ValueRef::TinyInt(v) => Value::Number(f64::from(v)),
        ValueRef::SmallInt(v) => Value::Number(f64::from(v)),
        ValueRef::Int(v) => Value::Number(f64::from(v)),
        ValueRef::BigInt(v) => Value::Number(v as f64),
        ValueRef::HugeInt(v) => Value::Number(v as f64),
        ValueRef::UTinyInt(v) => Value::Number(f64::from(v)),
        ValueRef::USmallInt(v) => Value::Number(f64::from(v)),
        ValueRef::UInt(v) => Value::Number(f64::from(v)),
        ValueRef::UBigInt(v) => Value::Number(v as f64),
        ValueRef::Float(v) => Value::Number(f64::from(v)),
        ValueRef::Double(v) => Value::Number(v),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Timestamp(unit, raw) => from_micros(micros(unit, raw)),
        ValueRef::Date32(days) => from_days(days),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        other => Value::Text(format!("{:?}", other)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use std::io::Write;

    #[tokio::test]
    async fn test_fetch_converts_types() -> Result<()> {
        let source = DuckDbSource::new(":memory:");
        source.execute(
            "CREATE TABLE orders (day DATE, orders INTEGER, revenue DECIMAL(10,2), status VARCHAR);
             INSERT INTO orders VALUES
                ('2024-01-01', 10, 99.50, 'delivered'),
                ('2024-01-02', NULL, 12.25, 'canceled');",
        )?;

        let table = source
            .fetch("SELECT day, orders, revenue, status FROM orders ORDER BY day")
            .await
            .ok_or_else(|| anyhow::anyhow!("no table returned"))?;

        assert_eq!(table.columns(), ["day", "orders", "revenue", "status"]);
        assert_eq!(table.len(), 2);

        let first: Vec<Value> = table.rows().next().unwrap().to_vec();
        let jan_1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(first[0], Value::from(jan_1));
        assert_eq!(first[1], Value::Number(10.0));
        assert_eq!(first[2], Value::Number(99.5));
        assert_eq!(first[3], Value::Text("delivered".into()));

        let second: Vec<Value> = table.rows().nth(1).unwrap().to_vec();
        assert_eq!(second[1], Value::Null);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_query_is_no_data() {
        let source = DuckDbSource::new(":memory:");
        assert!(source.fetch("SELECT * FROM non_existent_table").await.is_none());
    }

    #[tokio::test]
    async fn test_register_csv_source() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let csv_path = dir.path().join("daily.csv");
        let mut file = std::fs::File::create(&csv_path)?;
        writeln!(file, "order_purchase_date,total_daily_orders")?;
        writeln!(file, "2024-01-01,10")?;
        writeln!(file, "2024-01-02,12")?;
        drop(file);

        let source = DuckDbSource::new(":memory:");
        source
            .register_source("daily", &csv_path.to_string_lossy())
            .await?;

        let table = source
            .fetch("SELECT * FROM daily")
            .await
            .ok_or_else(|| anyhow::anyhow!("view not readable"))?;
        assert_eq!(table.len(), 2);
        assert!(table.has_column("total_daily_orders"));
        Ok(())
    }

    #[test]
    fn test_snippet_truncates_long_queries() {
        let long = format!("SELECT {}", "x, ".repeat(100));
        let s = snippet(&long);
        assert!(s.ends_with("..."));
        assert_eq!(s.chars().count(), QUERY_SNIPPET_CHARS + 3);
        assert_eq!(snippet("SELECT\n  1"), "SELECT 1");
    }
}
