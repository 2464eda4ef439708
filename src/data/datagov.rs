//! data.gov.in integration for the daily mandi price resource.
//!
//! Used to refresh the local dataset file; queries themselves never touch the
//! network.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::PriceRecord;
use crate::error::AppError;
use crate::io::ingest::records_from_values;

const BASE_URL: &str = "https://api.data.gov.in/resource";
/// "Current daily price of various commodities from various markets (Mandi)".
const RESOURCE_ID: &str = "9ef84268-d588-465a-a308-a864a43d0070";
/// Public sample key published by data.gov.in; rate limited but works out of the box.
const PUBLIC_API_KEY: &str = "579b464db66ec23bdd000001b7573d90ad594b8c6f7c3356222ef31c";
const API_KEY_ENV_VAR: &str = "DATA_GOV_IN_API_KEY";
const PAGE_SIZE: usize = 1000;

/// Server-side filters; blank values are not sent.
#[derive(Debug, Clone, Default)]
pub struct SyncFilters {
    pub state: Option<String>,
    pub district: Option<String>,
    pub market: Option<String>,
    pub commodity: Option<String>,
}

impl SyncFilters {
    fn query_pairs(&self) -> Vec<(String, String)> {
        [
            ("state", &self.state),
            ("district", &self.district),
            ("market", &self.market),
            ("commodity", &self.commodity),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?.trim();
            (!value.is_empty()).then(|| (format!("filters[{key}]"), value.to_string()))
        })
        .collect()
    }
}

pub struct DataGovClient {
    client: Client,
    api_key: String,
}

impl DataGovClient {
    /// Client using `DATA_GOV_IN_API_KEY` (from the environment or `.env`),
    /// falling back to the public sample key.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let api_key = std::env::var(API_KEY_ENV_VAR)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| PUBLIC_API_KEY.to_string());
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Fetch up to `limit` records matching `filters`, paging as needed.
    pub fn fetch_records(
        &self,
        filters: &SyncFilters,
        limit: usize,
    ) -> Result<Vec<PriceRecord>, AppError> {
        let mut out = Vec::new();
        let mut offset = 0usize;

        while out.len() < limit {
            let page_size = PAGE_SIZE.min(limit - out.len());
            let page = self.fetch_page(filters, offset, page_size)?;
            let fetched = page.len();
            debug!(offset, fetched, "fetched data.gov.in page");

            let data = records_from_values(&page);
            out.extend(data.records);

            if fetched < page_size {
                break;
            }
            offset += fetched;
        }

        info!(records = out.len(), "fetched records from data.gov.in");
        Ok(out)
    }

    fn fetch_page(
        &self,
        filters: &SyncFilters,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{BASE_URL}/{RESOURCE_ID}");
        let offset = offset.to_string();
        let limit = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("api-key", self.api_key.as_str()),
                ("format", "json"),
                ("offset", offset.as_str()),
                ("limit", limit.as_str()),
            ])
            .query(&filters.query_pairs())
            .send()
            .map_err(|e| AppError::new(4, format!("data.gov.in request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("data.gov.in request failed with status {}.", resp.status()),
            ));
        }

        let body: RecordsResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse data.gov.in response: {e}")))?;

        Ok(body.records)
    }
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filters_are_not_sent() {
        let filters = SyncFilters {
            state: Some("Punjab".to_string()),
            district: Some("  ".to_string()),
            market: None,
            commodity: Some(" Wheat ".to_string()),
        };
        assert_eq!(
            filters.query_pairs(),
            vec![
                ("filters[state]".to_string(), "Punjab".to_string()),
                ("filters[commodity]".to_string(), "Wheat".to_string()),
            ]
        );
    }

    #[test]
    fn api_rows_map_onto_records() {
        let body: RecordsResponse = serde_json::from_str(
            r#"{"total": 1, "records": [{"state": "Punjab", "district": "Amritsar",
                "market": "Amritsar", "commodity": "Wheat", "variety": "Dara",
                "arrival_date": "10/03/2024", "min_price": "2200",
                "max_price": "2300", "modal_price": "2275"}]}"#,
        )
        .unwrap();

        let data = records_from_values(&body.records);
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0].commodity, "Wheat");
        assert_eq!(data.records[0].modal_price, Some(2275.0));
    }

    #[test]
    fn missing_records_field_is_empty() {
        let body: RecordsResponse = serde_json::from_str(r#"{"message": "quota"}"#).unwrap();
        assert!(body.records.is_empty());
    }
}
