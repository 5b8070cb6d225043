//! Prometheus metrics

use crate::market::Provider;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Trending fetch plus normalization
    TrendingRefresh,
    /// Tracked fetch, detection and normalization
    TrackedRefresh,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Whole-provider fetch failures
    FetchFailure,
    /// Alerts raised by the detector
    AlertRaised,
    /// Notifier invocations
    Notification,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Ids on the watchlist
    TrackedIds,
    /// Entities in the tracked snapshot
    TrackedEntities,
    /// Entities in the trending snapshot
    TrendingEntities,
    /// Alerts not yet expired
    ActiveAlerts,
}

impl LatencyMetric {
    fn name(self) -> &'static str {
        match self {
            LatencyMetric::TrendingRefresh => "oddswatch_trending_refresh_latency_ms",
            LatencyMetric::TrackedRefresh => "oddswatch_tracked_refresh_latency_ms",
        }
    }
}

impl CounterMetric {
    fn name(self) -> &'static str {
        match self {
            CounterMetric::FetchFailure => "oddswatch_fetch_failures_total",
            CounterMetric::AlertRaised => "oddswatch_alerts_raised_total",
            CounterMetric::Notification => "oddswatch_notifications_total",
        }
    }
}

impl GaugeMetric {
    fn name(self) -> &'static str {
        match self {
            GaugeMetric::TrackedIds => "oddswatch_tracked_ids",
            GaugeMetric::TrackedEntities => "oddswatch_tracked_entities",
            GaugeMetric::TrendingEntities => "oddswatch_trending_entities",
            GaugeMetric::ActiveAlerts => "oddswatch_active_alerts",
        }
    }
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, provider: Provider, duration: Duration) {
    let value_ms = duration.as_secs_f64() * 1000.0;
    metrics::histogram!(metric.name(), "provider" => provider.as_str()).record(value_ms);
    tracing::trace!(metric = metric.name(), provider = %provider, value_ms, "Recording latency");
}

/// Increment a counter, optionally labelled by provider
pub fn increment(metric: CounterMetric, provider: Option<Provider>, by: u64) {
    match provider {
        Some(provider) => {
            metrics::counter!(metric.name(), "provider" => provider.as_str()).increment(by)
        }
        None => metrics::counter!(metric.name()).increment(by),
    }
}

/// Set a gauge value, optionally labelled by provider
pub fn set_gauge(metric: GaugeMetric, provider: Option<Provider>, value: f64) {
    match provider {
        Some(provider) => metrics::gauge!(metric.name(), "provider" => provider.as_str()).set(value),
        None => metrics::gauge!(metric.name()).set(value),
    }
}
