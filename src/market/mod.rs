//! Market data module
//!
//! Canonical entity types plus the fetch capability for each upstream:
//! Polymarket events via the Gamma API and Kalshi markets via the trade API.

mod gamma;
mod kalshi;
mod types;

pub use gamma::{GammaClient, GammaEvent, GammaMarket, GAMMA_API_URL};
pub use kalshi::{KalshiClient, KalshiMarket, KALSHI_API_URL};
pub use types::{Entity, FetchError, Outcome, Provider};

use crate::telemetry::{increment, CounterMetric};
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

/// Fetch capability for one provider
///
/// Implementations return raw provider records; normalization happens in
/// [`crate::adapter`]. The trait is object safe so the engine can hold
/// `Arc<dyn MarketSource<Raw = ...>>` and tests can inject doubles.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Raw record type returned by this provider
    type Raw: Send + Sync + 'static;

    /// Provider this source fetches from, used for log and metric labels
    fn provider(&self) -> Provider;

    /// Fetch the provider's currently trending records
    async fn fetch_trending(&self) -> Result<Vec<Self::Raw>, FetchError>;

    /// Fetch a single record, `None` when the provider has no such id
    async fn fetch_by_id(&self, id: &str) -> Result<Option<Self::Raw>, FetchError>;

    /// Fetch several records concurrently
    ///
    /// Missing ids and failed lookups are dropped from the result; a partial
    /// miss never fails the whole call. Each failed lookup is counted as a
    /// fetch failure. Output order follows `ids`.
    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<Self::Raw>, FetchError> {
        let results = join_all(ids.iter().map(|id| self.fetch_by_id(id))).await;

        let mut records = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(Some(record)) => records.push(record),
                Ok(None) => tracing::debug!(provider = %self.provider(), id = %id, "No record for id"),
                Err(e) => {
                    tracing::warn!(provider = %self.provider(), id = %id, error = %e, "Lookup failed, dropping from batch");
                    increment(CounterMetric::FetchFailure, Some(self.provider()), 1);
                }
            }
        }

        Ok(records)
    }
}

/// Send a request and decode a JSON body, mapping non-success statuses
async fn send_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            provider,
            status,
            body,
        });
    }

    Ok(response.json().await?)
}
