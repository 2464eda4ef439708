//! Representative price resolution.
//!
//! Given a crop label, the aggregator:
//!
//! - normalizes it and maps colloquial names through the synonym table
//! - keeps records whose commodity equals or contains (either way) that key
//! - orders them most recent first, undated records last
//! - takes the median modal price of the newest `window` records
//! - converts per-quintal to per-kg and rounds to paise
//!
//! It never fails: when nothing usable is found the configured fallback price is
//! returned, tagged with the reason.

use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{FallbackReason, MarketPrice, PriceRecord, PriceSource};
use crate::matching::{SynonymTable, contains_match, normalize};

/// Default number of most recent matching records considered.
pub const DEFAULT_WINDOW: usize = 10;
/// Default per-kg price when nothing can be resolved.
pub const DEFAULT_FALLBACK_PRICE: f64 = 16.60;

/// Knobs for price resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// How many of the most recent matching records feed the median.
    pub window: usize,
    /// Returned (per `unit`) when no price can be resolved.
    pub fallback_price: f64,
    pub currency: String,
    pub unit: String,
    /// Kilograms per pricing unit of the dataset (a quintal).
    pub quintal_kg: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            fallback_price: DEFAULT_FALLBACK_PRICE,
            currency: "INR".to_string(),
            unit: "kg".to_string(),
            quintal_kg: 100.0,
        }
    }
}

/// Resolves crop labels to a single representative price.
#[derive(Debug, Clone)]
pub struct PriceAggregator {
    synonyms: SynonymTable,
    config: PricingConfig,
}

impl PriceAggregator {
    pub fn new(synonyms: SynonymTable, config: PricingConfig) -> Self {
        Self { synonyms, config }
    }

    /// Normalized, synonym-resolved matching key for a crop label.
    pub fn matching_key(&self, crop_label: &str) -> String {
        let normalized = normalize(crop_label);
        self.synonyms.resolve(&normalized).to_string()
    }

    /// Resolve a price from `records`.
    pub fn resolve(&self, records: &[PriceRecord], crop_label: &str) -> MarketPrice {
        let key = self.matching_key(crop_label);

        let matched: Vec<&PriceRecord> = records
            .par_iter()
            .filter(|r| r.is_usable() && contains_match(&normalize(&r.commodity), &key))
            .collect();

        if matched.is_empty() {
            warn!(crop = crop_label, key = %key, "no dataset records match crop");
            return self.fallback(crop_label, FallbackReason::NoMatch);
        }

        let window = recent_window(matched, self.config.window);
        let mut modals: Vec<f64> = window
            .iter()
            .filter_map(|r| r.modal_price)
            .filter(|p| p.is_finite() && *p > 0.0)
            .collect();

        let Some(median) = median(&mut modals) else {
            warn!(
                crop = crop_label,
                key = %key,
                window = window.len(),
                "matched records carry no valid modal price"
            );
            return self.fallback(crop_label, FallbackReason::NoValidPrice);
        };

        let price = round2(median / self.config.quintal_kg);
        info!(
            crop = crop_label,
            key = %key,
            samples = modals.len(),
            price,
            "resolved market price"
        );

        MarketPrice {
            price,
            currency: self.config.currency.clone(),
            unit: self.config.unit.clone(),
            crop_type: crop_label.to_string(),
            source: PriceSource::Resolved {
                matched: key,
                samples: modals.len(),
            },
        }
    }

    /// The structurally valid default answer.
    pub fn fallback(&self, crop_label: &str, reason: FallbackReason) -> MarketPrice {
        debug!(crop = crop_label, ?reason, "using fallback price");
        MarketPrice {
            price: round2(self.config.fallback_price),
            currency: self.config.currency.clone(),
            unit: self.config.unit.clone(),
            crop_type: crop_label.to_string(),
            source: PriceSource::Fallback { reason },
        }
    }
}

impl Default for PriceAggregator {
    fn default() -> Self {
        Self::new(SynonymTable::default(), PricingConfig::default())
    }
}

/// Parse an arrival date.
///
/// `dd/mm/yyyy` is the dataset's format; ISO `yyyy-mm-dd` is also accepted.
/// Anything else is `None`, which orders after every real date.
pub fn parse_arrival_date(raw: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Most recent first, undated last, at most `window` records.
///
/// The sort is stable, so records with equal dates keep dataset order.
pub fn recent_window(records: Vec<&PriceRecord>, window: usize) -> Vec<&PriceRecord> {
    let mut dated: Vec<(Option<NaiveDate>, &PriceRecord)> = records
        .into_iter()
        .map(|r| (parse_arrival_date(&r.arrival_date), r))
        .collect();
    // `None < Some(_)`, so descending order puts undated rows at the end.
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.into_iter().take(window).map(|(_, r)| r).collect()
}

/// Median of `values` (sorted in place). Even counts average the middle pair.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(commodity: &str, date: &str, modal: Option<f64>) -> PriceRecord {
        PriceRecord {
            state: "Punjab".to_string(),
            district: "Ludhiana".to_string(),
            market: "Khanna".to_string(),
            commodity: commodity.to_string(),
            arrival_date: date.to_string(),
            modal_price: modal,
            ..PriceRecord::default()
        }
    }

    fn resolved_price(price: &MarketPrice) -> f64 {
        assert!(!price.is_fallback(), "unexpected fallback: {:?}", price.source);
        price.price
    }

    #[test]
    fn odd_count_takes_middle_value() {
        let records = vec![
            record("Wheat", "01/03/2024", Some(2000.0)),
            record("Wheat", "02/03/2024", Some(2200.0)),
            record("Wheat", "03/03/2024", Some(2100.0)),
        ];
        let price = PriceAggregator::default().resolve(&records, "Wheat");
        assert_eq!(resolved_price(&price), 21.0);
        assert_eq!(price.currency, "INR");
        assert_eq!(price.unit, "kg");
        assert_eq!(price.crop_type, "Wheat");
        assert_eq!(
            price.source,
            PriceSource::Resolved {
                matched: "wheat".to_string(),
                samples: 3
            }
        );
    }

    #[test]
    fn even_count_averages_middle_pair() {
        let records = vec![
            record("Wheat", "01/03/2024", Some(2200.0)),
            record("Wheat", "02/03/2024", Some(2000.0)),
        ];
        let price = PriceAggregator::default().resolve(&records, "wheat");
        assert_eq!(resolved_price(&price), 21.0);
    }

    #[test]
    fn synonym_maps_paddy_to_rice_records() {
        let records = vec![
            record("Rice", "01/03/2024", Some(3000.0)),
            record("Paddy(Dhan)(Common)", "02/03/2024", Some(2200.0)),
            record("Broken Rice", "03/03/2024", Some(2600.0)),
        ];
        let price = PriceAggregator::default().resolve(&records, "Paddy");
        // Only the records whose commodity contains "rice" take part.
        assert_eq!(resolved_price(&price), 28.0);
        assert_eq!(price.crop_type, "Paddy");
    }

    #[test]
    fn only_the_ten_most_recent_records_count() {
        let mut records = Vec::new();
        // Old, expensive rows that must fall outside the window.
        for day in 1..=5 {
            records.push(record("Onion", &format!("{day:02}/01/2023"), Some(9000.0)));
        }
        for day in 1..=10 {
            records.push(record("Onion", &format!("{day:02}/06/2024"), Some(1500.0)));
        }
        let price = PriceAggregator::default().resolve(&records, "Onion");
        assert_eq!(resolved_price(&price), 15.0);
    }

    #[test]
    fn undated_records_sort_last_but_are_kept() {
        let records = vec![
            record("Tomato", "not a date", Some(4000.0)),
            record("Tomato", "", Some(4000.0)),
            record("Tomato", "05/05/2024", Some(1000.0)),
        ];
        let price = PriceAggregator::default().resolve(&records, "Tomato");
        assert_eq!(resolved_price(&price), 40.0);

        let config = PricingConfig {
            window: 1,
            ..PricingConfig::default()
        };
        let narrow =
            PriceAggregator::new(SynonymTable::default(), config).resolve(&records, "Tomato");
        assert_eq!(resolved_price(&narrow), 10.0);
    }

    #[test]
    fn invalid_prices_are_excluded_not_zeroed() {
        let records = vec![
            record("Maize", "01/01/2024", Some(0.0)),
            record("Maize", "02/01/2024", Some(-5.0)),
            record("Maize", "03/01/2024", None),
            record("Maize", "04/01/2024", Some(1850.0)),
        ];
        let price = PriceAggregator::default().resolve(&records, "Maize");
        assert_eq!(resolved_price(&price), 18.5);
    }

    #[test]
    fn no_match_falls_back() {
        let records = vec![record("Wheat", "01/01/2024", Some(2000.0))];
        let price = PriceAggregator::default().resolve(&records, "Quinoa");
        assert_eq!(price.price, 16.6);
        assert_eq!(price.crop_type, "Quinoa");
        assert_eq!(
            price.source,
            PriceSource::Fallback {
                reason: FallbackReason::NoMatch
            }
        );
    }

    #[test]
    fn matches_without_prices_fall_back() {
        let records = vec![record("Garlic", "01/01/2024", None)];
        let price = PriceAggregator::default().resolve(&records, "Garlic");
        assert_eq!(price.price, 16.6);
        assert_eq!(
            price.source,
            PriceSource::Fallback {
                reason: FallbackReason::NoValidPrice
            }
        );
    }

    #[test]
    fn blank_label_and_blank_commodities_never_match() {
        let mut blank = record("", "01/01/2024", Some(2000.0));
        blank.state = "Punjab".to_string();
        let records = vec![blank, record("Wheat", "01/01/2024", Some(2000.0))];

        let agg = PriceAggregator::default();
        assert!(agg.resolve(&records, "").is_fallback());
        assert!(agg.resolve(&records, "(n/a)").is_fallback());
        assert!(agg.resolve(&records[..1], "Wheat").is_fallback());
    }

    #[test]
    fn arrival_dates() {
        assert_eq!(parse_arrival_date("05/01/2024"), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(parse_arrival_date(" 2024-01-05 "), NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(parse_arrival_date("31/02/2024"), None);
        assert_eq!(parse_arrival_date("2024/01/05"), None);
        assert_eq!(parse_arrival_date(""), None);
    }

    #[test]
    fn median_and_rounding() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(round2(21.456), 21.46);
        assert_eq!(round2(16.6), 16.6);
    }

    #[test]
    fn rounding_is_half_up_on_the_scaled_value() {
        // 2150.5 / 100 is stored just below 21.505, but scaling back by 100
        // lands on 2150.5 exactly, which rounds away from zero.
        assert_eq!(round2(2150.5 / 100.0), 21.51);

        let aggregator = PriceAggregator::default();
        let price = aggregator.resolve(&[record("Wheat", "01/03/2024", Some(2150.5))], "Wheat");
        assert_eq!(price.price, 21.51);
    }
}
