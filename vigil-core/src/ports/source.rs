// vigil-core/src/ports/source.rs

// What the pipeline needs from a data warehouse, without knowing which one.
// A failed query is reported as "no data", never as an error: the caller
// decides whether a metric can go on without its table.

use crate::domain::table::Table;
use crate::error::VigilError;
use async_trait::async_trait;

#[async_trait]
pub trait TabularSource: Send + Sync {
    /// Runs `query` and returns its rows, or `None` when the query could not be served.
    async fn fetch(&self, query: &str) -> Option<Table>;

    /// Exposes a file (CSV, Parquet) as a named relation queries can refer to.
    async fn register_source(&self, name: &str, path: &str) -> Result<(), VigilError>;

    fn engine_name(&self) -> &str;
}
