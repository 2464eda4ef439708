//! Dataset ingest.
//!
//! This module is responsible for turning a reference price file into a clean
//! list of `PriceRecord`s that the store can hand out read-only.
//!
//! Design goals:
//! - **Tolerant schema**: field names match case-insensitively, several spellings
//!   of the price columns are accepted, unknown fields are ignored
//! - **Row-level validation**: skip entries that aren't records, but report what happened
//! - **Deterministic behavior**: no inference beyond the fixed alias lists
//! - **Separation of concerns**: no matching or pricing logic here
//!
//! Two container formats are understood: a JSON array of objects (default) and a
//! CSV file with a header row (`.csv` extension).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use csv::StringRecord;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::PriceRecord;
use crate::error::DatasetError;

const STATE_KEYS: [&str; 1] = ["state"];
const DISTRICT_KEYS: [&str; 1] = ["district"];
const MARKET_KEYS: [&str; 1] = ["market"];
const COMMODITY_KEYS: [&str; 1] = ["commodity"];
const ARRIVAL_DATE_KEYS: [&str; 1] = ["arrival_date"];
/// Spellings of the modal price column, in priority order.
const MODAL_PRICE_KEYS: [&str; 3] = ["modal_x0020_price", "modalprice", "modal_price"];
const MIN_PRICE_KEYS: [&str; 3] = ["min_x0020_price", "minprice", "min_price"];
const MAX_PRICE_KEYS: [&str; 3] = ["max_x0020_price", "maxprice", "max_price"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based entry index (JSON) or file line (CSV).
    pub line: usize,
    pub message: String,
}

/// Ingest output: records + bookkeeping about what was skipped.
#[derive(Debug, Clone, Default)]
pub struct IngestedData {
    pub records: Vec<PriceRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// `.csv` (any case) selects CSV; everything else is read as JSON.
pub fn is_csv_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Load a dataset file, picking the format from its extension.
pub fn load_dataset(path: &Path) -> Result<IngestedData, DatasetError> {
    let data = if is_csv_path(path) {
        load_csv(path)?
    } else {
        load_json(path)?
    };

    if !data.row_errors.is_empty() {
        warn!(
            path = %path.display(),
            skipped = data.row_errors.len(),
            "some dataset entries were skipped"
        );
    }
    info!(
        path = %path.display(),
        rows_read = data.rows_read,
        records = data.records.len(),
        "dataset loaded"
    );
    Ok(data)
}

/// Parse a JSON array of record objects.
pub fn load_json(path: &Path) -> Result<IngestedData, DatasetError> {
    let raw = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    parse_json_records(&raw).map_err(|err| match err {
        JsonShapeError::Syntax(reason) => DatasetError::Malformed {
            path: path.to_path_buf(),
            reason,
        },
        JsonShapeError::NotAnArray => DatasetError::NotASequence {
            path: path.to_path_buf(),
        },
    })
}

enum JsonShapeError {
    Syntax(String),
    NotAnArray,
}

fn parse_json_records(raw: &str) -> Result<IngestedData, JsonShapeError> {
    // Spreadsheet exports sometimes prefix a BOM, which serde_json rejects.
    let raw = raw.trim_start_matches('\u{feff}');
    let value: Value =
        serde_json::from_str(raw).map_err(|e| JsonShapeError::Syntax(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(JsonShapeError::NotAnArray);
    };
    Ok(records_from_values(&items))
}

/// Convert already-parsed JSON entries into records.
///
/// Shared by file ingest and the data.gov.in client, whose API returns the same
/// row shape with lower-case keys.
pub fn records_from_values(items: &[Value]) -> IngestedData {
    let mut data = IngestedData {
        records: Vec::with_capacity(items.len()),
        ..IngestedData::default()
    };

    for (idx, item) in items.iter().enumerate() {
        data.rows_read += 1;
        let Value::Object(object) = item else {
            debug!(entry = idx + 1, "skipping non-object dataset entry");
            data.row_errors.push(RowError {
                line: idx + 1,
                message: format!("Expected an object, found {}", json_kind(item)),
            });
            continue;
        };

        // First spelling wins when a row carries e.g. both `State` and `state`.
        let mut fields: HashMap<String, &Value> = HashMap::with_capacity(object.len());
        for (key, value) in object {
            fields.entry(normalize_header_name(key)).or_insert(value);
        }

        data.records
            .push(build_record(|name| fields.get(name).copied().and_then(json_cell)));
    }

    data
}

/// Parse a CSV file with a header row.
pub fn load_csv(path: &Path) -> Result<IngestedData, DatasetError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| DatasetError::Malformed {
            path: path.to_path_buf(),
            reason: format!("failed to read CSV headers: {e}"),
        })?
        .clone();

    let header_map = build_header_map(&headers);
    let mut data = IngestedData::default();

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        data.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!(line, "skipping unparseable CSV row");
                data.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        data.records.push(build_record(|name| {
            get_optional(&record, &header_map, name).map(Cow::Borrowed)
        }));
    }

    Ok(data)
}

fn build_record<'a, F>(get: F) -> PriceRecord
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    PriceRecord {
        state: text_field(&get, &STATE_KEYS),
        district: text_field(&get, &DISTRICT_KEYS),
        market: text_field(&get, &MARKET_KEYS),
        commodity: text_field(&get, &COMMODITY_KEYS),
        arrival_date: text_field(&get, &ARRIVAL_DATE_KEYS),
        modal_price: number_field(&get, &MODAL_PRICE_KEYS),
        min_price: number_field(&get, &MIN_PRICE_KEYS),
        max_price: number_field(&get, &MAX_PRICE_KEYS),
    }
}

fn first_present<'a, F>(get: &F, keys: &[&str]) -> Option<Cow<'a, str>>
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    keys.iter().find_map(|key| get(key))
}

fn text_field<'a, F>(get: &F, keys: &[&str]) -> String
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    first_present(get, keys)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// The first present spelling decides; an unparseable value there is `None`
/// even if a later spelling would have parsed.
fn number_field<'a, F>(get: &F, keys: &[&str]) -> Option<f64>
where
    F: Fn(&str) -> Option<Cow<'a, str>>,
{
    parse_opt_f64(first_present(get, keys).as_deref())
}

/// JSON scalars as text; `null`, arrays and objects count as absent.
fn json_cell(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn io_error(path: &Path, err: std::io::Error) -> DatasetError {
    match err.kind() {
        ErrorKind::NotFound => DatasetError::Missing {
            path: path.to_path_buf(),
        },
        _ => DatasetError::Unreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        },
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 files with a BOM prefix on the
    // first header (e.g. "\u{feff}State"). If we don't strip it, that column
    // silently goes missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
