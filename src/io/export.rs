//! Write records back out as a dataset file.
//!
//! The container follows the same extension rule as ingest (`.csv` is CSV,
//! anything else a JSON array), and the field spellings are the ones ingest
//! prefers, so a file written here loads back without any alias guessing.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::PriceRecord;
use crate::error::AppError;
use crate::io::ingest::is_csv_path;

const CSV_HEADER: [&str; 8] = [
    "State",
    "District",
    "Market",
    "Commodity",
    "Arrival_Date",
    "Min_x0020_Price",
    "Max_x0020_Price",
    "Modal_x0020_Price",
];

/// Write records as a dataset file, CSV or JSON by extension.
///
/// The file is written next to its destination first and renamed into place, so
/// a store reloading concurrently never sees a half-written dataset.
pub fn write_dataset(path: &Path, records: &[PriceRecord]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to create directory '{}': {e}", parent.display()),
            )
        })?;
    }

    let tmp_path = temp_path_for(path)?;
    let file = File::create(&tmp_path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create dataset '{}': {e}", tmp_path.display()),
        )
    })?;

    let written = if is_csv_path(path) {
        write_csv(file, records)
    } else {
        write_json(file, records)
    };
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to move dataset into '{}': {e}", path.display()),
        )
    })?;

    Ok(())
}

/// `<name>.tmp` in the destination directory, keeping the full file name.
fn temp_path_for(path: &Path) -> Result<PathBuf, AppError> {
    let name = path.file_name().ok_or_else(|| {
        AppError::new(2, format!("Dataset path '{}' has no file name.", path.display()))
    })?;
    let mut tmp_name = OsString::from(name);
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

fn write_json(file: File, records: &[PriceRecord]) -> Result<(), AppError> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|e| AppError::new(2, format!("Failed to write dataset JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush dataset JSON: {e}")))
}

fn write_csv(file: File, records: &[PriceRecord]) -> Result<(), AppError> {
    let csv_err = |e: csv::Error| AppError::new(2, format!("Failed to write dataset CSV: {e}"));

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer.write_record(CSV_HEADER).map_err(csv_err)?;

    for r in records {
        let (min, max, modal) = (
            fmt_price(r.min_price),
            fmt_price(r.max_price),
            fmt_price(r.modal_price),
        );
        writer
            .write_record([
                r.state.as_str(),
                r.district.as_str(),
                r.market.as_str(),
                r.commodity.as_str(),
                r.arrival_date.as_str(),
                min.as_str(),
                max.as_str(),
                modal.as_str(),
            ])
            .map_err(csv_err)?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush dataset CSV: {e}")))
}

fn fmt_price(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
