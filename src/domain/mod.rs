//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - dataset rows (`PriceRecord`) and their hierarchical fields (`Field`)
//! - catalog filters (`CatalogFilters`)
//! - query outputs (`MarketPrice`, `PriceSource`, `ApiResponse`, `DatasetStats`)

pub mod types;

pub use types::*;
