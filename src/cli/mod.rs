//! CLI interface for odds-watch
//!
//! Provides subcommands for:
//! - `run`: Watch trending and tracked markets, printing alerts
//! - `trending`: One-shot trending fetch
//! - `config`: Show the effective configuration

mod format;
mod run;
mod trending;

pub use format::{format_alert, format_change, format_entity, format_prob, top_by_volume};
pub use run::RunArgs;
pub use trending::TrendingArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "odds-watch")]
#[command(about = "Watchlist tracker and move alerts for Polymarket and Kalshi")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch markets and print alerts until Ctrl-C
    Run(RunArgs),
    /// Fetch and print trending markets once
    Trending(TrendingArgs),
    /// Show the effective configuration
    Config,
}
