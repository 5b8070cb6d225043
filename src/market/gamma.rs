//! Gamma API client for Polymarket events
//!
//! Trending events come from the active events listing. Tracked events are
//! looked up one at a time, either by numeric event id or by slug.

use super::{send_json, FetchError, MarketSource, Provider};
use crate::config::PolymarketConfig;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: PolymarketConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new Gamma API client with default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(PolymarketConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: PolymarketConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { config, client })
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl MarketSource for GammaClient {
    type Raw = GammaEvent;

    fn provider(&self) -> Provider {
        Provider::Polymarket
    }

    async fn fetch_trending(&self) -> Result<Vec<GammaEvent>, FetchError> {
        let url = self.events_url();
        tracing::debug!(url = %url, "Fetching trending events from Gamma API");

        let request = self.client.get(&url).query(&[
            ("limit", self.config.trending_limit.to_string()),
            ("active", "true".to_string()),
            ("closed", "false".to_string()),
        ]);
        let events: Vec<GammaEvent> = send_json(Provider::Polymarket, request).await?;

        tracing::debug!(event_count = events.len(), "Fetched trending events");
        Ok(events)
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<GammaEvent>, FetchError> {
        if is_event_id(id) {
            let request = self.client.get(format!("{}/{}", self.events_url(), id));
            return match send_json(Provider::Polymarket, request).await {
                Ok(event) => Ok(Some(event)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            };
        }

        let request = self.client.get(self.events_url()).query(&[("slug", id)]);
        let events: Vec<GammaEvent> = send_json(Provider::Polymarket, request).await?;
        Ok(events.into_iter().next())
    }
}

/// Numeric inputs address events by id, anything else is a slug
fn is_event_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Event record from the Gamma API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaEvent {
    /// Event slug, the id used for tracking
    #[serde(default)]
    pub slug: String,
    /// Event title
    #[serde(default)]
    pub title: String,
    /// Total traded volume
    #[serde(default)]
    pub volume: Option<Decimal>,
    /// Sub-markets of this event
    #[serde(default)]
    pub markets: Option<Vec<GammaMarket>>,
    /// Outcome prices as a JSON-encoded string array, on bare records
    #[serde(default)]
    pub outcome_prices: Option<String>,
    /// One day price change, on bare records
    #[serde(default)]
    pub one_day_price_change: Option<Decimal>,
}

/// Sub-market record nested inside a Gamma event
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    /// Market question
    #[serde(default)]
    pub question: Option<String>,
    /// Short label within a grouped event (e.g. a candidate name)
    #[serde(default)]
    pub group_item_title: Option<String>,
    /// Outcome labels as a JSON-encoded string array
    #[serde(default)]
    pub outcomes: Option<String>,
    /// Outcome prices as a JSON-encoded string array
    #[serde(default)]
    pub outcome_prices: Option<String>,
    /// Last traded price
    #[serde(default)]
    pub last_trade_price: Option<Decimal>,
    /// One day price change
    #[serde(default)]
    pub one_day_price_change: Option<Decimal>,
}
