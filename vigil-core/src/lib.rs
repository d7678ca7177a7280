// vigil-core/src/lib.rs

// 1. Documentation is optional for now
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Interfaces / Traits)
// Contracts with the outside world (tabular data source).
pub mod ports;

// 2. Domain (Business core)
// Table model, outlier detectors, data preparation, check reports.
// Depends on NOTHING else (neither infra nor app).
pub mod domain;

// 3. Infrastructure (Adapters)
// DuckDB source, catalog configuration, filesystem.
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Pipeline runner and metric catalog orchestration.
// Depends on Domain, Infra and Ports.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use vigil_core::VigilError;
pub use error::VigilError;
