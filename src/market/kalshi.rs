//! Kalshi trade API client
//!
//! Kalshi has no trending endpoint, so the open-markets listing is ranked
//! by volume locally and capped.

use super::{send_json, FetchError, MarketSource, Provider};
use crate::config::KalshiConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Kalshi public API base URL
pub const KALSHI_API_URL: &str = "https://api.elections.kalshi.com";

/// Client for the Kalshi trade API v2
pub struct KalshiClient {
    config: KalshiConfig,
    client: Client,
}

impl KalshiClient {
    /// Create a new Kalshi client with default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(KalshiConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: KalshiConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { config, client })
    }

    fn markets_url(&self) -> String {
        format!(
            "{}/trade-api/v2/markets",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl MarketSource for KalshiClient {
    type Raw = KalshiMarket;

    fn provider(&self) -> Provider {
        Provider::Kalshi
    }

    async fn fetch_trending(&self) -> Result<Vec<KalshiMarket>, FetchError> {
        let url = self.markets_url();
        tracing::debug!(url = %url, "Fetching open markets from Kalshi");

        let request = self.client.get(&url).query(&[
            ("status", "open".to_string()),
            ("limit", self.config.fetch_limit.to_string()),
        ]);
        let listing: MarketsResponse = send_json(Provider::Kalshi, request).await?;

        let markets = rank_by_volume(listing.markets, self.config.trending_limit);
        tracing::debug!(market_count = markets.len(), "Ranked Kalshi markets");
        Ok(markets)
    }

    async fn fetch_by_id(&self, ticker: &str) -> Result<Option<KalshiMarket>, FetchError> {
        let request = self.client.get(format!("{}/{}", self.markets_url(), ticker));

        match send_json::<MarketResponse>(Provider::Kalshi, request).await {
            Ok(response) => Ok(response.market),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Sort by volume descending and keep the first `limit`
fn rank_by_volume(mut markets: Vec<KalshiMarket>, limit: usize) -> Vec<KalshiMarket> {
    markets.sort_by(|a, b| b.volume.unwrap_or(0).cmp(&a.volume.unwrap_or(0)));
    markets.truncate(limit);
    markets
}

/// Market record from the Kalshi trade API. Prices are in cents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KalshiMarket {
    /// Market ticker, the id used for tracking
    pub ticker: String,
    /// Market title
    #[serde(default)]
    pub title: String,
    /// Best yes bid
    #[serde(default)]
    pub yes_bid: Option<i64>,
    /// Yes bid at the previous reference point
    #[serde(default)]
    pub previous_yes_bid: Option<i64>,
    /// Last traded price
    #[serde(default)]
    pub last_price: Option<i64>,
    /// Lifetime contract volume
    #[serde(default)]
    pub volume: Option<i64>,
    /// Volume over the last 24 hours
    #[serde(default)]
    pub volume_24h: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MarketsResponse {
    #[serde(default)]
    markets: Vec<KalshiMarket>,
}

#[derive(Debug, Deserialize)]
struct MarketResponse {
    market: Option<KalshiMarket>,
}
