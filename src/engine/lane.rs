//! Per-provider state and refresh cycles

use super::Shared;
use crate::adapter::Adapter;
use crate::delta::Detection;
use crate::market::{Entity, MarketSource};
use crate::telemetry::{increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric};
use crate::watchlist::{Watchlist, WatchlistError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Provider-agnostic view of a lane, so the engine can dispatch on
/// [`Provider`](crate::market::Provider)
#[async_trait]
pub(crate) trait ProviderLane: Send + Sync {
    /// Replace the trending snapshot; a failed fetch leaves it empty
    async fn refresh_trending(&self);

    /// Fetch the watchlist, run detection and replace the tracked snapshot
    ///
    /// Returns `None` when the watchlist is empty or the batch went stale
    /// because the watchlist changed while it was in flight.
    async fn refresh_tracked(&self) -> Option<Detection>;

    async fn trending(&self) -> Vec<Entity>;

    async fn tracked(&self) -> Vec<Entity>;

    async fn tracked_ids(&self) -> Vec<String>;

    /// Normalize and add an id; `Ok(false)` if it was already tracked
    async fn add(&self, input: &str) -> Result<bool, WatchlistError>;

    /// Remove an id and drop its entity from the tracked snapshot
    async fn remove(&self, id: &str) -> bool;
}

#[derive(Default)]
struct LaneState {
    watchlist: Watchlist,
    /// Bumped on every watchlist mutation
    generation: u64,
    trending: Vec<Entity>,
    tracked: Vec<Entity>,
}

/// One provider: its adapter, fetch source, watchlist and snapshots
pub(crate) struct Lane<A: Adapter> {
    adapter: A,
    source: Arc<dyn MarketSource<Raw = A::Raw>>,
    state: RwLock<LaneState>,
    shared: Arc<Shared>,
}

impl<A: Adapter> Lane<A> {
    /// Create a lane seeded with the startup watchlist
    ///
    /// Ids that fail normalization are logged and skipped.
    pub fn new(
        adapter: A,
        source: Arc<dyn MarketSource<Raw = A::Raw>>,
        shared: Arc<Shared>,
        initial: &[String],
    ) -> Self {
        let mut watchlist = Watchlist::new();
        for input in initial {
            match adapter.normalize_id(input) {
                Ok(id) => {
                    watchlist.insert(id);
                }
                Err(e) => tracing::warn!(provider = %A::PROVIDER, input = %input, error = %e, "Skipping watchlist entry"),
            }
        }
        set_gauge(GaugeMetric::TrackedIds, Some(A::PROVIDER), watchlist.len() as f64);

        Self {
            adapter,
            source,
            state: RwLock::new(LaneState {
                watchlist,
                ..LaneState::default()
            }),
            shared,
        }
    }

    fn fetch_failed(&self, what: &'static str, error: &dyn std::fmt::Display) {
        tracing::warn!(provider = %A::PROVIDER, error = %error, "{} fetch failed", what);
        increment(CounterMetric::FetchFailure, Some(A::PROVIDER), 1);
    }
}

#[async_trait]
impl<A: Adapter> ProviderLane for Lane<A> {
    async fn refresh_trending(&self) {
        let start = Instant::now();

        let records = match self.source.fetch_trending().await {
            Ok(records) => records,
            Err(e) => {
                self.fetch_failed("Trending", &e);
                Vec::new()
            }
        };
        let entities: Vec<Entity> = records.iter().map(|r| self.adapter.normalize(r)).collect();

        record_latency(LatencyMetric::TrendingRefresh, A::PROVIDER, start.elapsed());
        set_gauge(GaugeMetric::TrendingEntities, Some(A::PROVIDER), entities.len() as f64);
        tracing::debug!(provider = %A::PROVIDER, count = entities.len(), "Trending refreshed");

        self.state.write().await.trending = entities;
    }

    async fn refresh_tracked(&self) -> Option<Detection> {
        let (ids, generation) = {
            let state = self.state.read().await;
            (state.watchlist.ids().to_vec(), state.generation)
        };
        if ids.is_empty() {
            return None;
        }

        let start = Instant::now();
        let batch = match self.source.fetch_by_ids(&ids).await {
            Ok(batch) => batch,
            Err(e) => {
                self.fetch_failed("Tracked", &e);
                Vec::new()
            }
        };

        // lock order: lane state, detector, alerts
        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(provider = %A::PROVIDER, "Watchlist changed mid-fetch, discarding batch");
            return None;
        }

        let detection = {
            let mut detector = self.shared.detector.lock().await;
            let mut alerts = self.shared.alerts.write().await;
            let detection = detector.detect(&self.adapter, &batch, &mut alerts, (self.shared.clock)());
            set_gauge(GaugeMetric::ActiveAlerts, None, alerts.len() as f64);
            detection
        };
        state.tracked = batch.iter().map(|r| self.adapter.normalize(r)).collect();

        record_latency(LatencyMetric::TrackedRefresh, A::PROVIDER, start.elapsed());
        set_gauge(GaugeMetric::TrackedEntities, Some(A::PROVIDER), state.tracked.len() as f64);
        if detection.has_alerts() {
            increment(
                CounterMetric::AlertRaised,
                Some(A::PROVIDER),
                detection.crossings.len() as u64,
            );
        }
        if detection.notified {
            increment(CounterMetric::Notification, None, 1);
        }
        tracing::debug!(
            provider = %A::PROVIDER,
            requested = ids.len(),
            received = state.tracked.len(),
            alerts = detection.crossings.len(),
            "Tracked refreshed"
        );

        Some(detection)
    }

    async fn trending(&self) -> Vec<Entity> {
        self.state.read().await.trending.clone()
    }

    async fn tracked(&self) -> Vec<Entity> {
        self.state.read().await.tracked.clone()
    }

    async fn tracked_ids(&self) -> Vec<String> {
        self.state.read().await.watchlist.ids().to_vec()
    }

    async fn add(&self, input: &str) -> Result<bool, WatchlistError> {
        let id = self.adapter.normalize_id(input)?;

        let mut state = self.state.write().await;
        if !state.watchlist.insert(id.clone()) {
            return Ok(false);
        }
        state.generation += 1;
        set_gauge(GaugeMetric::TrackedIds, Some(A::PROVIDER), state.watchlist.len() as f64);

        tracing::info!(provider = %A::PROVIDER, id = %id, "Tracking");
        Ok(true)
    }

    async fn remove(&self, id: &str) -> bool {
        // accept ids in the same loose form `add` does
        let id = self
            .adapter
            .normalize_id(id)
            .unwrap_or_else(|_| id.to_string());

        let mut state = self.state.write().await;
        if !state.watchlist.remove(&id) {
            return false;
        }
        state.generation += 1;
        state.tracked.retain(|entity| entity.id != id);
        set_gauge(GaugeMetric::TrackedIds, Some(A::PROVIDER), state.watchlist.len() as f64);
        set_gauge(GaugeMetric::TrackedEntities, Some(A::PROVIDER), state.tracked.len() as f64);

        tracing::info!(provider = %A::PROVIDER, id = %id, "Untracked");
        true
    }
}
