//! Reporting utilities: text and JSON rendering of query results.

pub mod format;

pub use format::*;
