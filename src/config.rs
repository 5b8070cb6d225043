//! Configuration types for odds-watch

use crate::market::{GAMMA_API_URL, KALSHI_API_URL};
use crate::telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub polymarket: PolymarketConfig,
    #[serde(default)]
    pub kalshi: KalshiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Polymarket (Gamma API) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PolymarketConfig {
    #[serde(default = "default_gamma_url")]
    pub base_url: String,
    /// Number of trending events requested
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gamma_url() -> String {
    GAMMA_API_URL.to_string()
}
fn default_trending_limit() -> usize {
    20
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for PolymarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_gamma_url(),
            trending_limit: default_trending_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Kalshi trade API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiConfig {
    #[serde(default = "default_kalshi_url")]
    pub base_url: String,
    /// Number of markets kept after ranking by volume
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
    /// Number of open markets requested before ranking
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_kalshi_url() -> String {
    KALSHI_API_URL.to_string()
}
fn default_fetch_limit() -> usize {
    100
}

impl Default for KalshiConfig {
    fn default() -> Self {
        Self {
            base_url: default_kalshi_url(),
            trending_limit: default_trending_limit(),
            fetch_limit: default_fetch_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Polling cadence for the background tasks
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_trending_interval_ms")]
    pub trending_interval_ms: u64,
    #[serde(default = "default_tracked_interval_ms")]
    pub tracked_interval_ms: u64,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

fn default_trending_interval_ms() -> u64 {
    5 * 60 * 1000
}
fn default_tracked_interval_ms() -> u64 {
    15_000
}
fn default_sweep_interval_ms() -> u64 {
    2_000
}

impl SchedulerConfig {
    pub fn trending_interval(&self) -> Duration {
        Duration::from_millis(self.trending_interval_ms)
    }

    pub fn tracked_interval(&self) -> Duration {
        Duration::from_millis(self.tracked_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trending_interval_ms: default_trending_interval_ms(),
            tracked_interval_ms: default_tracked_interval_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

/// Alert detection and lifetime
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Minimum absolute move of the top outcome that raises an alert
    #[serde(default = "default_threshold")]
    pub threshold: Decimal,
    /// How long an alert stays active
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

fn default_threshold() -> Decimal {
    Decimal::new(5, 2) // 0.05 = 5 points
}
fn default_ttl_ms() -> u64 {
    10_000
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

/// Notifier backend selection
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,
    /// Program to spawn for `kind = "command"`
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Notifier backend
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    None,
    Log,
    #[default]
    Bell,
    Command,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Bell,
            command: None,
            args: vec![],
        }
    }
}

/// Ids tracked from startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistConfig {
    #[serde(default)]
    pub polymarket: Vec<String>,
    #[serde(default)]
    pub kalshi: Vec<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port, disabled when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
