//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - scanned in-memory by the catalog and pricing code
//! - printed as JSON by the CLI
//! - written back out as a dataset file after a `sync`

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// One row of the reference price dataset.
///
/// Text fields are trimmed at ingest but otherwise kept exactly as the source
/// spelled them (casing, variety annotations, punctuation), since catalog
/// listings display the raw values.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "Market")]
    pub market: String,
    #[serde(rename = "Commodity")]
    pub commodity: String,
    /// Raw arrival date, expected as `dd/mm/yyyy` but not guaranteed parseable.
    #[serde(rename = "Arrival_Date")]
    pub arrival_date: String,
    /// Modal price per quintal. May be missing, zero or negative in the source.
    #[serde(rename = "Modal_x0020_Price", skip_serializing_if = "Option::is_none")]
    pub modal_price: Option<f64>,
    #[serde(rename = "Min_x0020_Price", skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(rename = "Max_x0020_Price", skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl PriceRecord {
    /// Rows without a state or commodity are kept in storage but never take
    /// part in catalog listings or matching.
    pub fn is_usable(&self) -> bool {
        !self.state.is_empty() && !self.commodity.is_empty()
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::State => &self.state,
            Field::District => &self.district,
            Field::Market => &self.market,
            Field::Commodity => &self.commodity,
        }
    }
}

/// Hierarchical location/commodity field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    State,
    District,
    Market,
    Commodity,
}

impl Field {
    pub fn plural(self) -> &'static str {
        match self {
            Field::State => "states",
            Field::District => "districts",
            Field::Market => "markets",
            Field::Commodity => "commodities",
        }
    }
}

/// Optional upstream filters for a catalog listing.
///
/// Blank values are treated as absent, so `Some("")` never filters anything out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    pub state: Option<String>,
    pub district: Option<String>,
    pub market: Option<String>,
}

impl CatalogFilters {
    pub fn new(state: Option<&str>, district: Option<&str>, market: Option<&str>) -> Self {
        Self {
            state: non_blank(state),
            district: non_blank(district),
            market: non_blank(market),
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = non_blank(Some(state));
        self
    }

    pub fn with_district(mut self, district: &str) -> Self {
        self.district = non_blank(Some(district));
        self
    }

    pub fn with_market(mut self, market: &str) -> Self {
        self.market = non_blank(Some(market));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.district.is_none() && self.market.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Why a price query fell back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The dataset could not be loaded at all.
    DatasetUnavailable,
    /// No record's commodity matched the requested label.
    NoMatch,
    /// Records matched, but none in the recency window had a usable modal price.
    NoValidPrice,
}

/// Where a `MarketPrice` came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceSource {
    Resolved {
        /// Canonical key the records were matched against.
        matched: String,
        /// Number of modal prices the median was taken over.
        samples: usize,
    },
    Fallback {
        reason: FallbackReason,
    },
}

/// Representative price for a crop, per kg.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPrice {
    pub price: f64,
    pub currency: String,
    pub unit: String,
    /// The label exactly as the caller supplied it.
    pub crop_type: String,
    pub source: PriceSource,
}

impl MarketPrice {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, PriceSource::Fallback { .. })
    }
}

/// `{success: true, data}` / `{success: false, error}` envelope used by list queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, QueryError>> for ApiResponse<T> {
    fn from(value: Result<T, QueryError>) -> Self {
        match value {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Summary of a loaded dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub rows: usize,
    pub usable_rows: usize,
    pub states: usize,
    pub commodities: usize,
    pub earliest_arrival: Option<NaiveDate>,
    pub latest_arrival: Option<NaiveDate>,
    /// Rows whose arrival date could not be parsed.
    pub undated_rows: usize,
    /// Rows with a finite, positive modal price.
    pub priced_rows: usize,
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}
