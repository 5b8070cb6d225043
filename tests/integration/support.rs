//! In-memory market sources and a manual clock

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use odds_watch::config::Config;
use odds_watch::engine::{Clock, Engine};
use odds_watch::market::{FetchError, GammaEvent, KalshiMarket, MarketSource, Provider};
use odds_watch::notify::Notifier;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source serving records from a map, with switchable failure and latency
pub struct ScriptedSource<R> {
    provider: Provider,
    records: Mutex<HashMap<String, R>>,
    trending: Mutex<Vec<R>>,
    failing: AtomicBool,
    delay: Mutex<Duration>,
    batches: AtomicUsize,
}

impl<R: Clone> ScriptedSource<R> {
    pub fn new(provider: Provider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            records: Mutex::new(HashMap::new()),
            trending: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            batches: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, id: &str, record: R) {
        self.records.lock().unwrap().insert(id.to_string(), record);
    }

    pub fn set_trending(&self, records: Vec<R>) {
        *self.trending.lock().unwrap() = records;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Number of tracked batches requested so far
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                provider: self.provider,
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Clone + Send + Sync + 'static> MarketSource for ScriptedSource<R> {
    type Raw = R;

    fn provider(&self) -> Provider {
        self.provider
    }

    async fn fetch_trending(&self) -> Result<Vec<R>, FetchError> {
        self.check()?;
        Ok(self.trending.lock().unwrap().clone())
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<R>, FetchError> {
        self.check()?;
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn fetch_by_ids(&self, ids: &[String]) -> Result<Vec<R>, FetchError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check()?;

        let records = self.records.lock().unwrap();
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }
}

/// Gamma source that fails lookups for chosen ids
///
/// Keeps the default `fetch_by_ids`, so batches go through the per-id
/// fan-out the HTTP clients use.
pub struct FlakyGamma {
    records: Mutex<HashMap<String, GammaEvent>>,
    failing: Mutex<HashSet<String>>,
}

impl FlakyGamma {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
        })
    }

    pub fn set(&self, id: &str, record: GammaEvent) {
        self.records.lock().unwrap().insert(id.to_string(), record);
    }

    pub fn set_failing(&self, id: &str, failing: bool) {
        let mut ids = self.failing.lock().unwrap();
        if failing {
            ids.insert(id.to_string());
        } else {
            ids.remove(id);
        }
    }
}

#[async_trait]
impl MarketSource for FlakyGamma {
    type Raw = GammaEvent;

    fn provider(&self) -> Provider {
        Provider::Polymarket
    }

    async fn fetch_trending(&self) -> Result<Vec<GammaEvent>, FetchError> {
        Ok(vec![])
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<GammaEvent>, FetchError> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(FetchError::Status {
                provider: Provider::Polymarket,
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().get(id).cloned())
    }
}

/// Clock advanced by hand
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        *self.now.lock().unwrap() += chrono::Duration::milliseconds(ms);
    }

    pub fn clock(&self) -> Clock {
        let now = Arc::clone(&self.now);
        Arc::new(move || *now.lock().unwrap())
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    calls: AtomicUsize,
}

impl CountingNotifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Notifier for CountingNotifier {
    fn play_alert(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Bare Gamma event whose top outcome has probability `prob`
pub fn event(slug: &str, prob: &str) -> GammaEvent {
    GammaEvent {
        slug: slug.to_string(),
        title: format!("Event {}", slug),
        outcome_prices: Some(format!(r#"["{}"]"#, prob)),
        ..GammaEvent::default()
    }
}

/// Kalshi market with a yes bid in cents
pub fn market(ticker: &str, yes_bid: i64) -> KalshiMarket {
    KalshiMarket {
        ticker: ticker.to_string(),
        title: format!("Market {}", ticker),
        yes_bid: Some(yes_bid),
        ..KalshiMarket::default()
    }
}

pub struct Harness {
    pub engine: Arc<Engine>,
    pub polymarket: Arc<ScriptedSource<GammaEvent>>,
    pub kalshi: Arc<ScriptedSource<KalshiMarket>>,
    pub notifier: Arc<CountingNotifier>,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let polymarket = ScriptedSource::new(Provider::Polymarket);
        let kalshi = ScriptedSource::new(Provider::Kalshi);
        let notifier = Arc::new(CountingNotifier::default());
        let clock = ManualClock::new();

        let engine = Engine::builder(config)
            .polymarket_source(polymarket.clone())
            .kalshi_source(kalshi.clone())
            .notifier(notifier.clone())
            .clock(clock.clock())
            .build()
            .unwrap();

        Self {
            engine: Arc::new(engine),
            polymarket,
            kalshi,
            notifier,
            clock,
        }
    }

    pub async fn tracked_ids(&self, provider: Provider) -> Vec<String> {
        let mut ids: Vec<String> = self
            .engine
            .tracked_snapshot(provider)
            .await
            .into_iter()
            .map(|e| e.id)
            .collect();
        ids.sort();
        ids
    }
}
