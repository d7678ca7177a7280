// vigil-core/src/domain/mod.rs

pub mod detection;
pub mod error;
pub mod table;

// Handy re-exports to simplify imports elsewhere
pub use error::DomainError;
pub use table::{Table, Value};
