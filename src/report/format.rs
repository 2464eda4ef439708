//! Formatted terminal output for query results.
//!
//! We keep formatting code in one place so:
//! - the engine stays free of presentation concerns
//! - output changes are localized (the shell and the one-shot commands share it)

use serde::Serialize;

use crate::domain::{
    ApiResponse, DatasetStats, FallbackReason, MarketPrice, OutputFormat, PriceSource,
};
use crate::error::{AppError, QueryError};

/// One value per line under a `<heading> (n):` line.
pub fn format_list(heading: &str, values: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{heading} ({}):\n", values.len()));
    if values.is_empty() {
        out.push_str("  (none)\n");
    }
    for v in values {
        out.push_str(&format!("  {v}\n"));
    }
    out
}

/// Text for a failed list query.
pub fn format_failure(err: &QueryError) -> String {
    format!("error: {err}\n")
}

/// Human-readable summary of a resolved (or fallback) price.
pub fn format_price(price: &MarketPrice) -> String {
    let mut out = format!(
        "{}: {:.2} {}/{}",
        price.crop_type, price.price, price.currency, price.unit
    );
    match &price.source {
        PriceSource::Resolved { matched, samples } => {
            out.push_str(&format!(
                " (median of {samples} recent record{} for \"{matched}\")",
                if *samples == 1 { "" } else { "s" }
            ));
        }
        PriceSource::Fallback { reason } => {
            let why = match reason {
                FallbackReason::DatasetUnavailable => "dataset unavailable",
                FallbackReason::NoMatch => "no matching records",
                FallbackReason::NoValidPrice => "no valid recent prices",
            };
            out.push_str(&format!(" (fallback: {why})"));
        }
    }
    out.push('\n');
    out
}

pub fn format_stats(stats: &DatasetStats) -> String {
    let mut out = String::new();
    out.push_str("=== mandi - dataset summary ===\n");
    out.push_str(&format!(
        "Rows: {} | usable={} | priced={} | undated={}\n",
        stats.rows, stats.usable_rows, stats.priced_rows, stats.undated_rows
    ));
    out.push_str(&format!(
        "Distinct: states={} | commodities={}\n",
        stats.states, stats.commodities
    ));
    match (stats.earliest_arrival, stats.latest_arrival) {
        (Some(first), Some(last)) => {
            out.push_str(&format!("Arrivals: {first} .. {last}\n"));
        }
        _ => out.push_str("Arrivals: (no dated rows)\n"),
    }
    out
}

/// Pretty JSON for anything serializable, as printed by `--format json`.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(2, format!("Failed to serialize output: {e}")))
}

/// The `{success, data}` / `{success, error}` envelope for a list query.
pub fn list_envelope(result: Result<Vec<String>, QueryError>) -> Result<String, AppError> {
    to_json(&ApiResponse::from(result))
}

/// Render a list query in the requested format.
pub fn render_list(
    format: OutputFormat,
    heading: &str,
    result: Result<Vec<String>, QueryError>,
) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => list_envelope(result).map(|s| s + "\n"),
        OutputFormat::Text => Ok(match result {
            Ok(values) => format_list(heading, &values),
            Err(err) => format_failure(&err),
        }),
    }
}

pub fn render_price(format: OutputFormat, price: &MarketPrice) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => to_json(price).map(|s| s + "\n"),
        OutputFormat::Text => Ok(format_price(price)),
    }
}

pub fn render_stats(format: OutputFormat, stats: &DatasetStats) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => to_json(stats).map(|s| s + "\n"),
        OutputFormat::Text => Ok(format_stats(stats)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(source: PriceSource) -> MarketPrice {
        MarketPrice {
            price: 21.0,
            currency: "INR".to_string(),
            unit: "kg".to_string(),
            crop_type: "Paddy".to_string(),
            source,
        }
    }

    #[test]
    fn list_has_count_and_one_value_per_line() {
        let out = format_list("Districts", &["Nashik".to_string(), "Pune".to_string()]);
        assert_eq!(out, "Districts (2):\n  Nashik\n  Pune\n");
        assert_eq!(format_list("States", &[]), "States (0):\n  (none)\n");
    }

    #[test]
    fn price_line_mentions_provenance() {
        let out = format_price(&price(PriceSource::Resolved {
            matched: "rice".to_string(),
            samples: 3,
        }));
        assert_eq!(out, "Paddy: 21.00 INR/kg (median of 3 recent records for \"rice\")\n");

        let out = format_price(&price(PriceSource::Fallback {
            reason: FallbackReason::NoMatch,
        }));
        assert!(out.ends_with("(fallback: no matching records)\n"));
    }

    #[test]
    fn envelope_shapes() {
        let ok = list_envelope(Ok(vec!["Punjab".to_string()])).unwrap();
        let v: serde_json::Value = serde_json::from_str(&ok).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["data"][0], "Punjab");
        assert!(v.get("error").is_none());

        let err = list_envelope(Err(QueryError::MissingArgument("state"))).unwrap();
        let v: serde_json::Value = serde_json::from_str(&err).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "Missing state");
    }

    #[test]
    fn stats_without_dates() {
        let stats = DatasetStats {
            rows: 0,
            usable_rows: 0,
            states: 0,
            commodities: 0,
            earliest_arrival: None,
            latest_arrival: None,
            undated_rows: 0,
            priced_rows: 0,
        };
        assert!(format_stats(&stats).contains("Arrivals: (no dated rows)"));
    }

    #[test]
    fn text_failure_is_one_line() {
        let out = render_list(
            OutputFormat::Text,
            "Districts",
            Err(QueryError::MissingArgument("state")),
        )
        .unwrap();
        assert_eq!(out, "error: Missing state\n");
    }
}
