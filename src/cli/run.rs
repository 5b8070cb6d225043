//! Run command implementation

use super::format::{format_alert, format_entity};
use crate::alert::{Alert, AlertMap};
use crate::config::Config;
use crate::engine::Engine;
use crate::market::Provider;
use chrono::{DateTime, Utc};
use clap::Args;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Polymarket event slug or URL to track (repeatable)
    #[arg(long, value_name = "ID")]
    pub polymarket: Vec<String>,

    /// Kalshi market ticker to track (repeatable)
    #[arg(long, value_name = "TICKER")]
    pub kalshi: Vec<String>,

    /// Seconds between tracked summaries, 0 to disable
    #[arg(long, default_value_t = 30)]
    pub status_interval_secs: u64,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let engine = Engine::new(config)?;

        let requested = [
            (Provider::Polymarket, &self.polymarket),
            (Provider::Kalshi, &self.kalshi),
        ];
        for (provider, ids) in requested {
            for id in ids {
                if let Err(e) = engine.add_tracked(provider, id).await {
                    tracing::warn!(provider = %provider, input = %id, error = %e, "Ignoring id");
                }
            }
        }

        let mut alerts = engine.subscribe_alerts();
        let mut seen = HashMap::new();
        engine.start().await;

        let summaries = self.status_interval_secs > 0;
        let period = Duration::from_secs(self.status_interval_secs.max(1));
        let mut status = tokio::time::interval_at(tokio::time::Instant::now() + period, period);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    tracing::info!("Shutting down");
                    break;
                }
                changed = alerts.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let active = alerts.borrow_and_update().clone();
                    for alert in fresh_alerts(&active, &mut seen) {
                        println!("{}", format_alert(&alert));
                    }
                }
                _ = status.tick(), if summaries => print_summary(&engine).await,
            }
        }

        engine.shutdown().await;
        Ok(())
    }
}

/// Alerts not printed yet, oldest first
///
/// An alert is new when its id is unseen or its timestamp changed. Expired
/// ids are forgotten so a later alert for them prints again.
fn fresh_alerts(active: &AlertMap, seen: &mut HashMap<String, DateTime<Utc>>) -> Vec<Alert> {
    seen.retain(|id, _| active.contains_key(id));

    let mut fresh: Vec<Alert> = active
        .values()
        .filter(|alert| seen.get(&alert.id) != Some(&alert.timestamp))
        .cloned()
        .collect();
    fresh.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    for alert in &fresh {
        seen.insert(alert.id.clone(), alert.timestamp);
    }
    fresh
}

async fn print_summary(engine: &Engine) {
    for provider in Provider::ALL {
        let tracked = engine.tracked_snapshot(provider).await;
        if tracked.is_empty() {
            continue;
        }
        println!("== {} tracked ({}) ==", provider, tracked.len());
        for entity in &tracked {
            println!("{}", format_entity(entity));
        }
    }
}
