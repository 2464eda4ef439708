//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the engine configuration (dataset path, synonyms, pricing)
//! - dispatches one-shot queries or the interactive shell
//! - downloads fresh data for `mandi sync`

use std::time::Duration;

use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, CommoditiesArgs, MarketsArgs, PriceArgs, ShellArgs, SyncArgs};
use crate::data::{DataGovClient, SyncFilters};
use crate::domain::{CatalogFilters, OutputFormat};
use crate::engine::{EngineConfig, MarketEngine};
use crate::error::{AppError, QueryError};
use crate::matching::SynonymTable;
use crate::report::{render_list, render_price, render_stats};

pub mod shell;

/// Entry point for the `mandi` binary.
pub fn run() -> Result<(), AppError> {
    // Bare `mandi` (or `mandi --dataset x.json`) opens the shell.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    dotenvy::dotenv().ok();
    crate::logging::init(&cli.log_level);

    let format = cli.format;
    match &cli.command {
        Command::States => {
            let engine = build_engine(&cli, None)?;
            print_list(format, "States", engine.get_states())
        }
        Command::Districts(args) => {
            let engine = build_engine(&cli, None)?;
            print_list(format, "Districts", engine.get_districts_by_state(&args.state))
        }
        Command::Markets(args) => handle_markets(&cli, args),
        Command::Commodities(args) => handle_commodities(&cli, args),
        Command::Price(args) => handle_price(&cli, args),
        Command::Stats(args) => handle_stats(&cli, args.require_data),
        Command::Sync(args) => handle_sync(args),
        Command::Shell(args) => handle_shell(&cli, args),
    }
}

fn handle_markets(cli: &Cli, args: &MarketsArgs) -> Result<(), AppError> {
    let engine = build_engine(cli, None)?;
    let result = engine.get_markets(&args.state, args.district.as_deref());
    print_list(cli.format, "Markets", result)
}

fn handle_commodities(cli: &Cli, args: &CommoditiesArgs) -> Result<(), AppError> {
    let engine = build_engine(cli, None)?;
    let filters = CatalogFilters::new(
        args.state.as_deref(),
        args.district.as_deref(),
        args.market.as_deref(),
    );
    print_list(cli.format, "Commodities", engine.get_commodities(&filters))
}

fn handle_price(cli: &Cli, args: &PriceArgs) -> Result<(), AppError> {
    let engine = build_engine(cli, Some(args))?;
    let price = engine.get_market_price(&args.crop);
    print!("{}", render_price(cli.format, &price)?);
    Ok(())
}

fn handle_stats(cli: &Cli, require_data: bool) -> Result<(), AppError> {
    let engine = build_engine(cli, None)?;
    let stats = engine.stats();
    print!("{}", render_stats(cli.format, &stats)?);

    if require_data && stats.usable_rows == 0 {
        let snapshot = engine.store().snapshot();
        let detail = match &snapshot.error {
            Some(err) => format!(": {err}"),
            None => String::new(),
        };
        return Err(AppError::new(3, format!("No usable rows in dataset{detail}")));
    }
    Ok(())
}

fn handle_sync(args: &SyncArgs) -> Result<(), AppError> {
    let filters = SyncFilters {
        state: args.state.clone(),
        district: args.district.clone(),
        market: args.market.clone(),
        commodity: args.commodity.clone(),
    };
    let client = DataGovClient::from_env();
    let records = client.fetch_records(&filters, args.limit)?;
    crate::io::export::write_dataset(&args.out, &records)?;

    info!(path = %args.out.display(), records = records.len(), "dataset written");
    println!("Wrote {} records to {}", records.len(), args.out.display());
    Ok(())
}

fn handle_shell(cli: &Cli, args: &ShellArgs) -> Result<(), AppError> {
    let engine = build_engine(cli, None)?;

    // Held for the lifetime of the shell; dropping it stops the refresher.
    let _refresh = match args.refresh_secs {
        Some(secs) if secs > 0 => Some(engine.start_refresh(Duration::from_secs(secs))?),
        _ => None,
    };

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    shell::run_shell(&engine, cli.format, stdin.lock(), stdout.lock())
}

/// Print a list result; a failed query is printed and then reported as a usage error.
fn print_list(
    format: OutputFormat,
    heading: &str,
    result: Result<Vec<String>, QueryError>,
) -> Result<(), AppError> {
    let failure = result.as_ref().err().cloned();
    match (format, &failure) {
        // The text rendering of a failure is the error message itself; let main print it once.
        (OutputFormat::Text, Some(_)) => {}
        _ => print!("{}", render_list(format, heading, result)?),
    }
    match failure {
        Some(err) => Err(AppError::new(2, err.to_string())),
        None => Ok(()),
    }
}

fn build_engine(cli: &Cli, price: Option<&PriceArgs>) -> Result<MarketEngine, AppError> {
    let config = engine_config_from_args(cli, price)?;
    info!(dataset = %config.dataset_path.display(), "using dataset");
    Ok(MarketEngine::from_config(config))
}

pub fn engine_config_from_args(
    cli: &Cli,
    price: Option<&PriceArgs>,
) -> Result<EngineConfig, AppError> {
    let mut config = EngineConfig::new(EngineConfig::resolve_dataset_path(cli.dataset.clone()));

    if let Some(path) = &cli.synonyms {
        config.synonyms = SynonymTable::with_overrides_from(path)?;
    }

    if let Some(args) = price {
        if let Some(window) = args.window {
            if window == 0 {
                return Err(AppError::new(2, "--window must be at least 1."));
            }
            config.pricing.window = window;
        }
        if let Some(fallback) = args.fallback_price {
            if !fallback.is_finite() || fallback < 0.0 {
                return Err(AppError::new(2, "--fallback-price must be a non-negative number."));
            }
            config.pricing.fallback_price = fallback;
        }
    }

    Ok(config)
}

/// Rewrite argv so `mandi` defaults to `mandi shell`.
///
/// Rules:
/// - `mandi`                        -> `mandi shell`
/// - `mandi --dataset x.json ...`   -> `mandi shell --dataset x.json ...`
/// - `mandi --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("shell".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // Flags only, no subcommand anywhere: treat them as shell flags.
    let has_subcommand = argv.iter().skip(1).any(|a| is_subcommand(a));
    if arg1.starts_with('-') && !has_subcommand {
        argv.insert(1, "shell".to_string());
    }

    argv
}

fn is_subcommand(arg: &str) -> bool {
    matches!(
        arg,
        "states" | "districts" | "markets" | "commodities" | "price" | "stats" | "sync" | "shell"
    )
}
