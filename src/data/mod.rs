//! Remote data sources.

pub mod datagov;

pub use datagov::*;
