// vigil-core/src/infrastructure/config/mod.rs

pub mod catalog;

pub use catalog::{CatalogConfig, MetricConfig, load_catalog, parse_catalog};
