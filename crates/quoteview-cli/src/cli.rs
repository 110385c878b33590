//! CLI argument definitions for quoteview.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Serve `/quote`, `/candles` and `/search` over HTTP |
//! | `show` | Load one symbol/range and print the resulting view state |
//!
//! # Global Options
//!
//! | Option | Env | Default | Description |
//! |--------|-----|---------|-------------|
//! | `--timeout-ms` | `QUOTEVIEW_TIMEOUT_MS` | `10000` | Per-fetch timeout |
//! | `--mock` | | `false` | Deterministic offline providers |
//! | `--finnhub-api-key` | `FINNHUB_API_KEY` | | Token for symbol search |
//!
//! # Examples
//!
//! ```bash
//! quoteview serve --bind 0.0.0.0:3000
//! quoteview show AAPL --range 6M --pretty
//! quoteview --mock show tsla --range 1D --cursor 1717200000
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use quoteview_core::RangeSelection;

#[derive(Debug, Parser)]
#[command(
    name = "quoteview",
    author,
    version,
    about = "Single-instrument quote and candle chart backend"
)]
pub struct Cli {
    /// Upper bound for each upstream fetch, in milliseconds.
    #[arg(
        long,
        global = true,
        env = "QUOTEVIEW_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_ms: u64,

    /// Serve deterministic offline data instead of calling providers.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Finnhub API token used by symbol search.
    #[arg(long, global = true, env = "FINNHUB_API_KEY", hide_env_values = true)]
    pub finnhub_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the quote, candle and search endpoints.
    Serve(ServeArgs),
    /// Run one load cycle and print the view state as JSON.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "QUOTEVIEW_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Ticker symbol, case-insensitive.
    pub symbol: String,

    /// Range button: 1D, 1M, 6M, 1Y, 5Y or Max.
    #[arg(long, default_value = "1Y")]
    pub range: RangeSelection,

    /// Also project the crosshair at this epoch-second candle time.
    #[arg(long)]
    pub cursor: Option<i64>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_defaults_to_one_year() {
        let cli = Cli::try_parse_from(["quoteview", "show", "aapl"]).expect("valid args");
        assert_eq!(cli.timeout_ms, 10_000);
        match cli.command {
            Command::Show(args) => {
                assert_eq!(args.symbol, "aapl");
                assert_eq!(args.range, RangeSelection::OneYear);
                assert_eq!(args.cursor, None);
            }
            Command::Serve(_) => panic!("expected show"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "quoteview", "show", "TSLA", "--range", "max", "--mock", "--timeout-ms", "250",
        ])
        .expect("valid args");
        assert!(cli.mock);
        assert_eq!(cli.fetch_timeout(), Duration::from_millis(250));
        assert!(matches!(cli.command, Command::Show(ShowArgs { range: RangeSelection::Max, .. })));
    }

    #[test]
    fn rejects_unknown_range_and_zero_timeout() {
        assert!(Cli::try_parse_from(["quoteview", "show", "AAPL", "--range", "2Y"]).is_err());
        assert!(Cli::try_parse_from(["quoteview", "--timeout-ms", "0", "show", "AAPL"]).is_err());
    }
}
