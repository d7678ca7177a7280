// vigil-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("{role} column '{column}' not found in table")]
    #[diagnostic(
        code(vigil::domain::missing_column),
        help("Check the column names returned by the dataset query.")
    )]
    MissingColumn { column: String, role: String },

    #[error("Column '{column}' row {row}: '{value}' is not a number")]
    #[diagnostic(code(vigil::domain::invalid_value))]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}' row {row}: '{value}' is not a date or timestamp")]
    #[diagnostic(
        code(vigil::domain::invalid_timestamp),
        help("Accepted formats: YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, RFC 3339.")
    )]
    InvalidTimestamp {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Invalid analysis mode '{0}'")]
    #[diagnostic(
        code(vigil::domain::mode),
        help("Must be TIME_AGGREGATED, TIME_RAW, or DISTRIBUTIONAL.")
    )]
    UnknownMode(String),

    #[error("Unknown frequency code '{0}'")]
    #[diagnostic(code(vigil::domain::frequency), help("Supported codes: D, W, M."))]
    UnknownFrequency(String),

    #[error("Unknown detection method '{0}'")]
    #[diagnostic(code(vigil::domain::method), help("Supported methods: IQR, Z-Score."))]
    UnknownMethod(String),

    #[error("frequencies list cannot be empty for TIME_AGGREGATED mode")]
    #[diagnostic(code(vigil::domain::frequencies))]
    EmptyFrequencies,

    #[error("Invalid parameter: {0}")]
    #[diagnostic(code(vigil::domain::parameter))]
    InvalidParameter(String),
}
