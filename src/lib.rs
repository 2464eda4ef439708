//! `mandi-resolver` library crate.
//!
//! The binary (`mandi`) is a thin wrapper around this library so that:
//!
//! - the query engine is testable without spawning processes
//! - `MarketEngine` can be embedded behind other front-ends (an HTTP service, a chat tool)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod catalog;
pub mod cli;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod logging;
pub mod matching;
pub mod pricing;
pub mod report;
pub mod store;

pub use engine::{EngineConfig, MarketEngine};
