//! Line-oriented interactive shell over one shared `MarketEngine`.
//!
//! Multi-word arguments are separated with `|`, e.g.
//! `markets Madhya Pradesh | Indore` or `commodities Punjab | | Amritsar`.

use std::io::{BufRead, Write};

use crate::domain::{CatalogFilters, OutputFormat};
use crate::engine::MarketEngine;
use crate::error::AppError;
use crate::report::{render_list, render_price, render_stats};

const HELP: &str = "\
commands:
  states
  districts <state>
  markets <state> [| <district>]
  commodities [<state>] [| <district>] [| <market>]
  price <crop>
  stats
  reload
  help
  quit
";

/// Read commands from `input` until EOF or `quit`, writing results to `out`.
pub fn run_shell<R: BufRead, W: Write>(
    engine: &MarketEngine,
    format: OutputFormat,
    input: R,
    mut out: W,
) -> Result<(), AppError> {
    let io_err = |e: std::io::Error| AppError::new(2, format!("Shell I/O failed: {e}"));

    write!(out, "mandi> ").map_err(io_err)?;
    out.flush().map_err(io_err)?;

    for line in input.lines() {
        let line = line.map_err(io_err)?;
        match execute(engine, format, &line)? {
            Some(text) => out.write_all(text.as_bytes()).map_err(io_err)?,
            None => break,
        }
        write!(out, "mandi> ").map_err(io_err)?;
        out.flush().map_err(io_err)?;
    }
    writeln!(out).map_err(io_err)?;
    Ok(())
}

/// Run one shell line. `None` means the shell should exit.
pub fn execute(
    engine: &MarketEngine,
    format: OutputFormat,
    line: &str,
) -> Result<Option<String>, AppError> {
    let line = line.trim();
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };
    let args = split_args(rest);
    let arg = |i: usize| args.get(i).copied().unwrap_or("");

    let text = match cmd.to_ascii_lowercase().as_str() {
        "" => String::new(),
        "quit" | "exit" | "q" => return Ok(None),
        "help" | "?" => HELP.to_string(),
        "states" => render_list(format, "States", engine.get_states())?,
        "districts" => render_list(format, "Districts", engine.get_districts_by_state(arg(0)))?,
        "markets" => render_list(
            format,
            "Markets",
            engine.get_markets(arg(0), Some(arg(1))),
        )?,
        "commodities" => {
            let filters = CatalogFilters::new(Some(arg(0)), Some(arg(1)), Some(arg(2)));
            render_list(format, "Commodities", engine.get_commodities(&filters))?
        }
        "price" => render_price(format, &engine.get_market_price(rest))?,
        "stats" => render_stats(format, &engine.stats())?,
        "reload" => match engine.reload() {
            Ok(snapshot) => format!("reloaded {} records\n", snapshot.records.len()),
            Err(err) => format!("reload failed: {err}\n"),
        },
        other => format!("unknown command: {other} (try `help`)\n"),
    };
    Ok(Some(text))
}

fn split_args(rest: &str) -> Vec<&str> {
    if rest.is_empty() {
        return Vec::new();
    }
    rest.split('|').map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::PriceRecord;
    use crate::pricing::PriceAggregator;
    use crate::store::RecordStore;

    fn record(
        state: &str,
        district: &str,
        market: &str,
        commodity: &str,
        modal: f64,
    ) -> PriceRecord {
        PriceRecord {
            state: state.to_string(),
            district: district.to_string(),
            market: market.to_string(),
            commodity: commodity.to_string(),
            arrival_date: "05/04/2024".to_string(),
            modal_price: Some(modal),
            ..PriceRecord::default()
        }
    }

    fn engine() -> MarketEngine {
        let store = RecordStore::from_records(vec![
            record("Madhya Pradesh", "Indore", "Indore", "Soyabean", 4400.0),
            record("Madhya Pradesh", "Ujjain", "Ujjain", "Wheat", 2300.0),
            record("Punjab", "Amritsar", "Amritsar", "Wheat", 2250.0),
        ]);
        MarketEngine::new(Arc::new(store), PriceAggregator::default())
    }

    fn run(line: &str) -> String {
        execute(&engine(), OutputFormat::Text, line).unwrap().unwrap()
    }

    #[test]
    fn pipe_separates_multi_word_arguments() {
        assert_eq!(run("markets Madhya Pradesh | Ujjain"), "Markets (1):\n  Ujjain\n");
        assert_eq!(run("commodities Punjab | | Amritsar"), "Commodities (1):\n  Wheat\n");
    }

    #[test]
    fn missing_state_is_reported_not_fatal() {
        assert_eq!(run("districts"), "error: Missing state\n");
    }

    #[test]
    fn price_takes_the_rest_of_the_line() {
        let out = run("price  Wheat ");
        assert!(out.starts_with("Wheat: 22.75 INR/kg"), "{out}");
    }

    #[test]
    fn quit_ends_the_session() {
        assert!(execute(&engine(), OutputFormat::Text, "quit").unwrap().is_none());

        let mut out = Vec::new();
        run_shell(
            &engine(),
            OutputFormat::Text,
            "states\nquit\nstates\n".as_bytes(),
            &mut out,
        )
        .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(out.matches("States (2):").count(), 1);
    }

    #[test]
    fn unknown_commands_point_at_help() {
        assert!(run("frobnicate").starts_with("unknown command: frobnicate"));
    }
}
