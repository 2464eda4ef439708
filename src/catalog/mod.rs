//! Hierarchical catalog listings (state → district → market → commodity).
//!
//! A listing is the set of distinct raw values of one field over the records
//! that satisfy every present filter. Filters are loose-matched, values are
//! deduplicated exactly (case-sensitive) and returned in collation order.

use std::cmp::Ordering;
use std::collections::HashSet;

use rayon::prelude::*;

use crate::domain::{CatalogFilters, Field, PriceRecord};
use crate::matching::{loose_match_normalized, normalize};

/// Filters normalized once per query instead of once per record.
struct PreparedFilters {
    state: Option<String>,
    district: Option<String>,
    market: Option<String>,
}

impl PreparedFilters {
    fn new(filters: &CatalogFilters) -> Self {
        Self {
            state: filters.state.as_deref().map(normalize),
            district: filters.district.as_deref().map(normalize),
            market: filters.market.as_deref().map(normalize),
        }
    }

    fn accepts(&self, record: &PriceRecord) -> bool {
        field_accepts(self.state.as_deref(), &record.state)
            && field_accepts(self.district.as_deref(), &record.district)
            && field_accepts(self.market.as_deref(), &record.market)
    }
}

fn field_accepts(filter: Option<&str>, value: &str) -> bool {
    let Some(filter) = filter else { return true };
    !value.is_empty() && loose_match_normalized(&normalize(value), filter)
}

/// Distinct values of `field` among usable records passing `filters`.
pub fn distinct_values(
    records: &[PriceRecord],
    field: Field,
    filters: &CatalogFilters,
) -> Vec<String> {
    let prepared = PreparedFilters::new(filters);

    let unique: HashSet<&str> = records
        .par_iter()
        .filter(|r| r.is_usable() && prepared.accepts(r))
        .map(|r| r.field(field))
        .filter(|v| !v.is_empty())
        .collect();

    let mut values: Vec<String> = unique.into_iter().map(str::to_string).collect();
    values.sort_by(|a, b| collate(a, b));
    values
}

/// Case-insensitive ordering with lower case first on ties.
///
/// Close to what a default locale collator does for the mostly-ASCII place and
/// crop names in the dataset ("apple" < "Banana", "rice" < "Rice").
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, district: &str, market: &str, commodity: &str) -> PriceRecord {
        PriceRecord {
            state: state.to_string(),
            district: district.to_string(),
            market: market.to_string(),
            commodity: commodity.to_string(),
            arrival_date: "01/01/2024".to_string(),
            modal_price: Some(1000.0),
            ..PriceRecord::default()
        }
    }

    fn sample() -> Vec<PriceRecord> {
        vec![
            record("Maharashtra", "Pune", "Pune", "Onion"),
            record("Maharashtra", "Nashik", "Lasalgaon", "Onion"),
            record("maharashtra", "Ahmednagar", "Rahuri", "Soyabean"),
            record("Maharashtra", "Pune", "Junnar", "Tomato"),
            record("Punjab", "Amritsar", "Amritsar", "Wheat"),
            record("Punjab", "Amritsar", "Amritsar(Amritsar Mewa Mandi)", "Potato"),
            record("Punjab", "Ludhiana", "Khanna", "Paddy(Dhan)(Common)"),
            record("Madhya Pradesh", "Indore", "Indore", "Soyabean"),
            record("", "Nowhere", "Nowhere", "Wheat"),
            record("Goa", "North Goa", "Mapusa", ""),
        ]
    }

    #[test]
    fn states_are_distinct_sorted_and_skip_unusable_rows() {
        let states = distinct_values(&sample(), Field::State, &CatalogFilters::default());
        // Dedup is on the raw value, so the differently-cased spelling survives.
        assert_eq!(
            states,
            vec!["Madhya Pradesh", "maharashtra", "Maharashtra", "Punjab"]
        );
    }

    #[test]
    fn districts_filtered_by_state() {
        let filters = CatalogFilters::default().with_state("MAHARASHTRA");
        let districts = distinct_values(&sample(), Field::District, &filters);
        assert_eq!(districts, vec!["Ahmednagar", "Nashik", "Pune"]);
    }

    #[test]
    fn markets_filtered_by_state_and_district() {
        let filters = CatalogFilters::default()
            .with_state("Maharashtra")
            .with_district("Pune");
        let markets = distinct_values(&sample(), Field::Market, &filters);
        assert_eq!(markets, vec!["Junnar", "Pune"]);
    }

    #[test]
    fn commodities_require_all_filters() {
        let filters = CatalogFilters::default()
            .with_state("Punjab")
            .with_market("Amritsar");
        let commodities = distinct_values(&sample(), Field::Commodity, &filters);
        assert_eq!(commodities, vec!["Potato", "Wheat"]);

        let filters = CatalogFilters::default()
            .with_state("Maharashtra")
            .with_market("Amritsar");
        assert!(distinct_values(&sample(), Field::Commodity, &filters).is_empty());
    }

    #[test]
    fn filters_need_not_be_hierarchical() {
        let filters = CatalogFilters::default().with_market("Khanna");
        let commodities = distinct_values(&sample(), Field::Commodity, &filters);
        assert_eq!(commodities, vec!["Paddy(Dhan)(Common)"]);
    }

    #[test]
    fn one_word_state_filter_matches_every_state_containing_it() {
        let filters = CatalogFilters::default().with_state("Pradesh");
        let states = distinct_values(&sample(), Field::State, &filters);
        assert_eq!(states, vec!["Madhya Pradesh"]);
    }

    #[test]
    fn unknown_filter_yields_nothing() {
        let filters = CatalogFilters::default().with_state("Atlantis");
        assert!(distinct_values(&sample(), Field::District, &filters).is_empty());
        assert!(distinct_values(&[], Field::State, &CatalogFilters::default()).is_empty());
    }

    #[test]
    fn prepared_filters_are_conjunctive() {
        let r = record("Punjab", "Ludhiana", "Khanna", "Wheat");
        let accepts = |filters: CatalogFilters| PreparedFilters::new(&filters).accepts(&r);
        assert!(accepts(CatalogFilters::default()));
        assert!(accepts(CatalogFilters::new(Some("punjab"), Some("ludhiana"), None)));
        assert!(!accepts(CatalogFilters::new(Some("punjab"), Some("amritsar"), None)));
    }

    #[test]
    fn collation_is_case_insensitive_lower_first() {
        let mut names = vec!["banana", "Apple", "apple", "Cherry"];
        names.sort_by(|a, b| collate(a, b));
        assert_eq!(names, vec!["apple", "Apple", "banana", "Cherry"]);
    }
}
