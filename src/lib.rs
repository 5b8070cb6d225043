//! odds-watch: Watchlist tracker and move alerts for prediction markets
//!
//! This library provides the core components for:
//! - Fetching trending and tracked markets from Polymarket and Kalshi
//! - Normalizing provider records into ranked outcome entities
//! - Per-provider watchlists with user input cleanup
//! - Move detection on the top outcome with short-lived alerts
//! - Scheduled refresh, sweep and notification
//! - Logging and Prometheus metrics

pub mod adapter;
pub mod alert;
pub mod cli;
pub mod config;
pub mod delta;
pub mod engine;
pub mod market;
pub mod notify;
pub mod telemetry;
pub mod watchlist;
