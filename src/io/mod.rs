//! Input/output helpers.
//!
//! - dataset ingest (JSON or CSV) + row validation (`ingest`)
//! - dataset JSON writer (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
