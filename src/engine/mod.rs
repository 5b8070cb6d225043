//! Watch engine
//!
//! Owns both provider lanes, the shared detector and alert store, and the
//! background tasks that keep them fresh:
//!
//! - trending refresh per provider, every `trending_interval_ms`
//! - tracked refresh per provider, every `tracked_interval_ms`, restarted
//!   (and fired at once) whenever that provider's watchlist changes
//! - alert sweep, every `sweep_interval_ms`
//!
//! Readers get cloned snapshots and never observe a half-applied cycle.

mod lane;
mod scheduler;

pub use scheduler::{FirstTick, PeriodicTask};

use crate::adapter::{KalshiAdapter, PolymarketAdapter};
use crate::alert::{AlertMap, AlertStore};
use crate::config::{Config, SchedulerConfig};
use crate::delta::{DeltaDetector, Detection};
use crate::market::{
    Entity, FetchError, GammaClient, GammaEvent, KalshiClient, KalshiMarket, MarketSource, Provider,
};
use crate::notify::{self, Notifier};
use crate::telemetry::{set_gauge, GaugeMetric};
use crate::watchlist::WatchlistError;
use chrono::{DateTime, Utc};
use lane::{Lane, ProviderLane};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};

/// Wall clock used to stamp and expire alerts
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// State shared by both lanes and the sweep task
pub(crate) struct Shared {
    detector: Mutex<DeltaDetector>,
    alerts: RwLock<AlertStore>,
    alerts_rx: watch::Receiver<Arc<AlertMap>>,
    clock: Clock,
}

struct Inner {
    polymarket: Arc<Lane<PolymarketAdapter>>,
    kalshi: Arc<Lane<KalshiAdapter>>,
    shared: Arc<Shared>,
    schedule: SchedulerConfig,
}

impl Inner {
    fn lane(&self, provider: Provider) -> Arc<dyn ProviderLane> {
        match provider {
            Provider::Polymarket => self.polymarket.clone(),
            Provider::Kalshi => self.kalshi.clone(),
        }
    }

    async fn sweep_alerts(&self) -> Arc<AlertMap> {
        let now = (self.shared.clock)();
        let active = self.shared.alerts.write().await.sweep(now);
        set_gauge(GaugeMetric::ActiveAlerts, None, active.len() as f64);
        active
    }
}

#[derive(Default)]
struct Tasks {
    running: bool,
    background: Vec<PeriodicTask>,
    tracked: HashMap<Provider, PeriodicTask>,
}

/// Builder for [`Engine`], for swapping in sources, notifier and clock
pub struct EngineBuilder {
    config: Config,
    polymarket: Option<Arc<dyn MarketSource<Raw = GammaEvent>>>,
    kalshi: Option<Arc<dyn MarketSource<Raw = KalshiMarket>>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Clock>,
}

impl EngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            polymarket: None,
            kalshi: None,
            notifier: None,
            clock: None,
        }
    }

    pub fn polymarket_source(mut self, source: Arc<dyn MarketSource<Raw = GammaEvent>>) -> Self {
        self.polymarket = Some(source);
        self
    }

    pub fn kalshi_source(mut self, source: Arc<dyn MarketSource<Raw = KalshiMarket>>) -> Self {
        self.kalshi = Some(source);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the engine; unset sources default to the HTTP clients
    pub fn build(self) -> Result<Engine, FetchError> {
        let config = self.config;

        let polymarket: Arc<dyn MarketSource<Raw = GammaEvent>> = match self.polymarket {
            Some(source) => source,
            None => Arc::new(GammaClient::with_config(config.polymarket.clone())?),
        };
        let kalshi: Arc<dyn MarketSource<Raw = KalshiMarket>> = match self.kalshi {
            Some(source) => source,
            None => Arc::new(KalshiClient::with_config(config.kalshi.clone())?),
        };
        let notifier = self
            .notifier
            .unwrap_or_else(|| notify::from_config(&config.notifier));
        let clock: Clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(Utc::now),
        };

        let alerts = AlertStore::new(Duration::from_millis(config.alerts.ttl_ms));
        let shared = Arc::new(Shared {
            detector: Mutex::new(DeltaDetector::new(config.alerts.threshold, notifier)),
            alerts_rx: alerts.subscribe(),
            alerts: RwLock::new(alerts),
            clock,
        });

        let inner = Inner {
            polymarket: Arc::new(Lane::new(
                PolymarketAdapter,
                polymarket,
                shared.clone(),
                &config.watchlist.polymarket,
            )),
            kalshi: Arc::new(Lane::new(
                KalshiAdapter,
                kalshi,
                shared.clone(),
                &config.watchlist.kalshi,
            )),
            shared,
            schedule: config.scheduler,
        };

        Ok(Engine {
            inner: Arc::new(inner),
            tasks: Mutex::new(Tasks::default()),
        })
    }
}

/// Trending and tracked market watcher with move alerts
pub struct Engine {
    inner: Arc<Inner>,
    tasks: Mutex<Tasks>,
}

impl Engine {
    /// Build an engine from config with the default HTTP sources
    pub fn new(config: Config) -> Result<Self, FetchError> {
        EngineBuilder::new(config).build()
    }

    pub fn builder(config: Config) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Alert threshold in effect
    pub async fn threshold(&self) -> Decimal {
        self.inner.shared.detector.lock().await.threshold()
    }

    /// Start all background tasks
    ///
    /// Trending refreshes and tracked refreshes for non-empty watchlists
    /// fire immediately; the first sweep runs one period in.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        if tasks.running {
            tracing::warn!("Engine already running");
            return;
        }
        tasks.running = true;

        for provider in Provider::ALL {
            let lane = self.inner.lane(provider);
            tasks.background.push(PeriodicTask::spawn(
                "trending-refresh",
                self.inner.schedule.trending_interval(),
                FirstTick::Immediate,
                move || {
                    let lane = lane.clone();
                    async move { lane.refresh_trending().await }
                },
            ));

            if !self.inner.lane(provider).tracked_ids().await.is_empty() {
                tasks.tracked.insert(provider, self.spawn_tracked(provider));
            }
        }

        let inner = self.inner.clone();
        tasks.background.push(PeriodicTask::spawn(
            "alert-sweep",
            self.inner.schedule.sweep_interval(),
            FirstTick::AfterPeriod,
            move || {
                let inner = inner.clone();
                async move {
                    inner.sweep_alerts().await;
                }
            },
        ));

        tracing::info!(
            trending_ms = self.inner.schedule.trending_interval_ms,
            tracked_ms = self.inner.schedule.tracked_interval_ms,
            sweep_ms = self.inner.schedule.sweep_interval_ms,
            "Engine started"
        );
    }

    /// Stop all background tasks, aborting in-flight fetches
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.running {
            return;
        }
        tasks.background.clear();
        tasks.tracked.clear();
        tasks.running = false;
        tracing::info!("Engine stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.tasks.lock().await.running
    }

    fn spawn_tracked(&self, provider: Provider) -> PeriodicTask {
        let lane = self.inner.lane(provider);
        PeriodicTask::spawn(
            "tracked-refresh",
            self.inner.schedule.tracked_interval(),
            FirstTick::Immediate,
            move || {
                let lane = lane.clone();
                async move {
                    lane.refresh_tracked().await;
                }
            },
        )
    }

    /// Replace a provider's tracked task after a watchlist change
    ///
    /// The old task is aborted, dropping any response still in flight. An
    /// empty watchlist leaves the provider without a tracked task.
    async fn restart_tracked(&self, provider: Provider) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.running {
            return;
        }
        tasks.tracked.remove(&provider);

        if self.inner.lane(provider).tracked_ids().await.is_empty() {
            tracing::debug!(provider = %provider, "Watchlist empty, tracked refresh idle");
            return;
        }
        tasks.tracked.insert(provider, self.spawn_tracked(provider));
    }

    /// Track an id; the provider's tracked refresh restarts immediately
    ///
    /// Returns `Ok(false)` when the id was already tracked.
    pub async fn add_tracked(&self, provider: Provider, input: &str) -> Result<bool, WatchlistError> {
        let added = self.inner.lane(provider).add(input).await?;
        if added {
            self.restart_tracked(provider).await;
        }
        Ok(added)
    }

    /// Stop tracking an id; its entity leaves the tracked snapshot at once
    ///
    /// Any alert already raised for the id lingers until it expires.
    pub async fn remove_tracked(&self, provider: Provider, id: &str) -> bool {
        let removed = self.inner.lane(provider).remove(id).await;
        if removed {
            self.restart_tracked(provider).await;
        }
        removed
    }

    /// Run one trending refresh now
    pub async fn refresh_trending(&self, provider: Provider) {
        self.inner.lane(provider).refresh_trending().await;
    }

    /// Run one tracked refresh now
    pub async fn refresh_tracked(&self, provider: Provider) -> Option<Detection> {
        self.inner.lane(provider).refresh_tracked().await
    }

    /// Expire old alerts now, returning the active set
    pub async fn sweep_alerts(&self) -> Arc<AlertMap> {
        self.inner.sweep_alerts().await
    }

    pub async fn trending_snapshot(&self, provider: Provider) -> Vec<Entity> {
        self.inner.lane(provider).trending().await
    }

    pub async fn tracked_snapshot(&self, provider: Provider) -> Vec<Entity> {
        self.inner.lane(provider).tracked().await
    }

    pub async fn tracked_ids(&self, provider: Provider) -> Vec<String> {
        self.inner.lane(provider).tracked_ids().await
    }

    /// Active alerts as last published
    pub fn alerts_snapshot(&self) -> Arc<AlertMap> {
        self.inner.shared.alerts_rx.borrow().clone()
    }

    /// Receive every published alert set
    pub fn subscribe_alerts(&self) -> watch::Receiver<Arc<AlertMap>> {
        self.inner.shared.alerts_rx.clone()
    }
}
