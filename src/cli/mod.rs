//! Command-line parsing for the mandi price resolver.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! query engine; `app` turns these structs into an `EngineConfig` and dispatches.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::OutputFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "mandi",
    version,
    about = "Agricultural mandi reference data and crop price resolver"
)]
pub struct Cli {
    /// Dataset file (JSON array or CSV). Defaults to $MANDI_DATASET, then data/crop_price.json.
    #[arg(long, global = true, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// JSON object of extra crop synonyms (`{"alias": "canonical"}`), merged over the built-ins.
    #[arg(long, global = true, value_name = "JSON")]
    pub synonyms: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all states.
    States,
    /// List districts of a state.
    Districts(DistrictsArgs),
    /// List markets of a state, optionally narrowed to a district.
    Markets(MarketsArgs),
    /// List commodities, optionally filtered by state, district and market.
    Commodities(CommoditiesArgs),
    /// Resolve a representative per-kg price for a crop.
    Price(PriceArgs),
    /// Summarize the loaded dataset.
    Stats(StatsArgs),
    /// Download records from data.gov.in and write them as a dataset file.
    Sync(SyncArgs),
    /// Interactive query loop over one shared engine.
    ///
    /// This is the default when `mandi` is run without a subcommand.
    Shell(ShellArgs),
}

#[derive(Debug, Args, Clone)]
pub struct DistrictsArgs {
    #[arg(long, default_value = "")]
    pub state: String,
}

#[derive(Debug, Args, Clone)]
pub struct MarketsArgs {
    #[arg(long, default_value = "")]
    pub state: String,

    #[arg(long)]
    pub district: Option<String>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct CommoditiesArgs {
    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub market: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct PriceArgs {
    /// Crop label as a user would type it (e.g. "Paddy", "Tomato").
    pub crop: String,

    /// Number of most recent matching records to take the median over.
    #[arg(long)]
    pub window: Option<usize>,

    /// Per-kg price returned when no market data resolves.
    #[arg(long)]
    pub fallback_price: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    /// Exit with code 3 when the dataset has no usable rows.
    #[arg(long)]
    pub require_data: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SyncArgs {
    /// Where to write the downloaded dataset (CSV for a `.csv` path, JSON array otherwise).
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,

    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub district: Option<String>,

    #[arg(long)]
    pub market: Option<String>,

    #[arg(long)]
    pub commodity: Option<String>,

    /// Maximum number of records to download.
    #[arg(long, default_value_t = 10_000)]
    pub limit: usize,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ShellArgs {
    /// Reload the dataset in the background every N seconds.
    #[arg(long, value_name = "N")]
    pub refresh_secs: Option<u64>,
}
