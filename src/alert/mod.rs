//! Active alerts with a time-to-live
//!
//! The store keeps its map behind an `Arc` and replaces it copy-on-write, so
//! a snapshot handed to a reader never changes underneath it. A sweep that
//! evicts nothing keeps the same `Arc`, letting observers detect change with
//! [`Arc::ptr_eq`]. Every committed change is published on a
//! [`tokio::sync::watch`] channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Active alerts keyed by entity id
pub type AlertMap = HashMap<String, Alert>;

/// A short-lived notice that an entity's top outcome moved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Entity id the alert belongs to
    pub id: String,
    /// Human readable description of the move
    pub message: String,
    /// Creation time, serialized as epoch milliseconds
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert
    pub fn new(id: impl Into<String>, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            timestamp,
        }
    }
}

/// Holds at most one active alert per id
pub struct AlertStore {
    alerts: Arc<AlertMap>,
    ttl_ms: i64,
    tx: watch::Sender<Arc<AlertMap>>,
}

impl AlertStore {
    /// Create an empty store whose alerts live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        let alerts = Arc::new(AlertMap::new());
        let (tx, _rx) = watch::channel(Arc::clone(&alerts));
        Self {
            alerts,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            tx,
        }
    }

    /// Current committed snapshot
    pub fn snapshot(&self) -> Arc<AlertMap> {
        Arc::clone(&self.alerts)
    }

    /// Receive every committed snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<AlertMap>> {
        self.tx.subscribe()
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.get(id)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Insert alerts, replacing any existing alert for the same id
    ///
    /// The batch is committed and published once. Returns how many alerts
    /// were written.
    pub fn raise_all(&mut self, alerts: impl IntoIterator<Item = Alert>) -> usize {
        let mut alerts = alerts.into_iter().peekable();
        if alerts.peek().is_none() {
            return 0;
        }

        let map = Arc::make_mut(&mut self.alerts);
        let mut written = 0;
        for alert in alerts {
            map.insert(alert.id.clone(), alert);
            written += 1;
        }

        self.publish();
        written
    }

    /// Evict alerts older than the TTL
    ///
    /// Returns the resulting snapshot. When nothing expired this is the
    /// same `Arc` as before the call and nothing is published.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Arc<AlertMap> {
        let ttl_ms = self.ttl_ms;
        let expired = |alert: &Alert| (now - alert.timestamp).num_milliseconds() > ttl_ms;

        if !self.alerts.values().any(expired) {
            return self.snapshot();
        }

        let map = Arc::make_mut(&mut self.alerts);
        let before = map.len();
        map.retain(|_, alert| !expired(alert));
        tracing::debug!(evicted = before - map.len(), remaining = map.len(), "Swept alerts");

        self.publish();
        self.snapshot()
    }

    fn publish(&self) {
        self.tx.send_replace(Arc::clone(&self.alerts));
    }
}
