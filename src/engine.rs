//! Query interface over the reference dataset.
//!
//! `MarketEngine` is what callers talk to: the CLI, the interactive shell, or
//! any embedding service. Each call grabs the current snapshot, scans it and
//! returns; nothing is mutated, so one engine can be shared across threads.
//!
//! Catalog queries return `Result<Vec<String>, QueryError>` and only fail on
//! missing required arguments. An unavailable dataset is "no data", not an
//! error. Price queries never fail.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::catalog::distinct_values;
use crate::domain::{CatalogFilters, DatasetStats, FallbackReason, Field, MarketPrice};
use crate::error::{AppError, DatasetError, QueryError};
use crate::matching::SynonymTable;
use crate::pricing::{PriceAggregator, PricingConfig};
use crate::store::{RecordStore, RefreshHandle, Snapshot};

/// Dataset path used when neither `--dataset` nor `MANDI_DATASET` is given.
pub const DEFAULT_DATASET_PATH: &str = "data/crop_price.json";
/// Environment variable naming the dataset file.
pub const DATASET_ENV_VAR: &str = "MANDI_DATASET";

/// Everything needed to build an engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub dataset_path: PathBuf,
    pub synonyms: SynonymTable,
    pub pricing: PricingConfig,
    /// Background reload interval; `None` keeps the first snapshot for the
    /// lifetime of the engine (until an explicit `reload`).
    pub refresh_interval: Option<Duration>,
}

impl EngineConfig {
    pub fn new(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            synonyms: SynonymTable::default(),
            pricing: PricingConfig::default(),
            refresh_interval: None,
        }
    }

    /// Dataset path from an explicit override, then the environment, then the default.
    pub fn resolve_dataset_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var_os(DATASET_ENV_VAR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH))
    }
}

#[derive(Debug)]
pub struct MarketEngine {
    store: Arc<RecordStore>,
    aggregator: PriceAggregator,
}

impl MarketEngine {
    pub fn new(store: Arc<RecordStore>, aggregator: PriceAggregator) -> Self {
        Self { store, aggregator }
    }

    /// Build an engine from config. The dataset is loaded lazily on first query.
    pub fn from_config(config: EngineConfig) -> Self {
        let store = Arc::new(RecordStore::open(config.dataset_path));
        Self::new(store, PriceAggregator::new(config.synonyms, config.pricing))
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Start periodic background reloads of the dataset.
    pub fn start_refresh(&self, interval: Duration) -> Result<RefreshHandle, AppError> {
        self.store.spawn_refresh(interval)
    }

    pub fn reload(&self) -> Result<Arc<Snapshot>, DatasetError> {
        self.store.reload()
    }

    pub fn get_states(&self) -> Result<Vec<String>, QueryError> {
        self.list(Field::State, &CatalogFilters::default())
    }

    pub fn get_districts_by_state(&self, state: &str) -> Result<Vec<String>, QueryError> {
        let filters = CatalogFilters::default().with_state(state);
        if filters.state.is_none() {
            return Err(QueryError::MissingArgument("state"));
        }
        self.list(Field::District, &filters)
    }

    pub fn get_markets(
        &self,
        state: &str,
        district: Option<&str>,
    ) -> Result<Vec<String>, QueryError> {
        let filters = CatalogFilters::new(Some(state), district, None);
        if filters.state.is_none() {
            return Err(QueryError::MissingArgument("state"));
        }
        self.list(Field::Market, &filters)
    }

    pub fn get_commodities(&self, filters: &CatalogFilters) -> Result<Vec<String>, QueryError> {
        self.list(Field::Commodity, filters)
    }

    /// Representative per-kg price for a crop label. Never fails.
    pub fn get_market_price(&self, crop_type: &str) -> MarketPrice {
        let snapshot = self.store.snapshot();
        if !snapshot.is_available() {
            return self
                .aggregator
                .fallback(crop_type, FallbackReason::DatasetUnavailable);
        }
        self.aggregator.resolve(&snapshot.records, crop_type)
    }

    /// Summary of the current snapshot.
    pub fn stats(&self) -> DatasetStats {
        self.store.snapshot().stats()
    }

    /// Distinct values of any field under the given filters.
    pub fn list(&self, field: Field, filters: &CatalogFilters) -> Result<Vec<String>, QueryError> {
        let snapshot = self.store.snapshot();
        let values = distinct_values(&snapshot.records, field, filters);
        debug!(
            field = field.plural(),
            ?filters,
            count = values.len(),
            available = snapshot.is_available(),
            "catalog listing"
        );
        Ok(values)
    }
}
