use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::models::range::RangeSelection;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a TOML config file. Without it, defaults plus DIP_* environment variables apply.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a chart and print its summary
    Chart {
        /// Ticker symbol (e.g. "AAPL")
        symbol: String,

        /// Range code: 1D, 1W, 1M, 1Y, ALL or DIP
        #[arg(long, default_value = "1D")]
        range: RangeSelection,

        /// Lookback in days for the DIP range
        #[arg(long)]
        dip_window_days: Option<u32>,

        /// Keep following live bars (1D only) until Ctrl+C
        #[arg(long)]
        watch: bool,
    },

    /// List the current dips
    Dips {
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Show a ticker's latest price, signals and alerts
    Ticker {
        /// Ticker symbol (e.g. "AAPL")
        symbol: String,
    },

    /// Ask the backend to re-ingest prices and recompute signals
    Refresh {
        /// Days of history to re-ingest
        #[arg(long, default_value = "30")]
        days: u32,
    },
}
