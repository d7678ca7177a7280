// vigil-core/src/ports/mod.rs

pub mod source;

pub use source::TabularSource;
