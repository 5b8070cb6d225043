//! Engine cycles driven one step at a time

use crate::support::{event, market, FlakyGamma, Harness, ScriptedSource};
use odds_watch::config::Config;
use odds_watch::engine::Engine;
use odds_watch::market::{KalshiMarket, Provider};
use odds_watch::notify::NoopNotifier;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_partial_failure_keeps_found_ids() {
    let h = Harness::new();
    h.polymarket.set("a", event("a", "0.40"));
    h.polymarket.set("c", event("c", "0.70"));
    for id in ["a", "b", "c"] {
        h.engine.add_tracked(Provider::Polymarket, id).await.unwrap();
    }

    let detection = h.engine.refresh_tracked(Provider::Polymarket).await.unwrap();

    assert_eq!(detection.observed, 2);
    assert_eq!(h.tracked_ids(Provider::Polymarket).await, vec!["a", "c"]);
    assert_eq!(h.engine.tracked_ids(Provider::Polymarket).await, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_failed_lookup_drops_id_until_it_recovers() {
    let source = FlakyGamma::new();
    for id in ["a", "b", "c"] {
        source.set(id, event(id, "0.40"));
    }
    source.set_failing("c", true);

    let engine = Engine::builder(Config::default())
        .polymarket_source(source.clone())
        .kalshi_source(ScriptedSource::<KalshiMarket>::new(Provider::Kalshi))
        .notifier(Arc::new(NoopNotifier))
        .build()
        .unwrap();
    for id in ["a", "b", "c"] {
        engine.add_tracked(Provider::Polymarket, id).await.unwrap();
    }

    engine.refresh_tracked(Provider::Polymarket).await;
    let ids: Vec<_> = engine
        .tracked_snapshot(Provider::Polymarket)
        .await
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["a", "b"]);

    source.set_failing("c", false);
    engine.refresh_tracked(Provider::Polymarket).await;
    let ids: Vec<_> = engine
        .tracked_snapshot(Provider::Polymarket)
        .await
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_first_refresh_then_crossing() {
    let h = Harness::new();
    h.polymarket.set("a", event("a", "0.40"));
    h.engine.add_tracked(Provider::Polymarket, "a").await.unwrap();

    h.engine.refresh_tracked(Provider::Polymarket).await;
    assert!(h.engine.alerts_snapshot().is_empty());

    h.polymarket.set("a", event("a", "0.45"));
    let detection = h.engine.refresh_tracked(Provider::Polymarket).await.unwrap();

    assert_eq!(detection.crossings.len(), 1);
    let alerts = h.engine.alerts_snapshot();
    assert_eq!(alerts["a"].message, "Sudden change! Top option moved by 5.0%");
    assert_eq!(h.notifier.calls(), 1);

    let tracked = h.engine.tracked_snapshot(Provider::Polymarket).await;
    assert_eq!(tracked[0].top_prob(), Some(dec!(0.45)));
}

#[tokio::test]
async fn test_five_crossings_one_notification() {
    let h = Harness::new();
    let ids = ["a", "b", "c", "d", "e"];
    for id in ids {
        h.polymarket.set(id, event(id, "0.20"));
        h.engine.add_tracked(Provider::Polymarket, id).await.unwrap();
    }
    h.engine.refresh_tracked(Provider::Polymarket).await;

    for id in ids {
        h.polymarket.set(id, event(id, "0.80"));
    }
    h.engine.refresh_tracked(Provider::Polymarket).await;

    assert_eq!(h.engine.alerts_snapshot().len(), 5);
    assert_eq!(h.notifier.calls(), 1);
}

#[tokio::test]
async fn test_removed_id_alert_lingers_until_expiry() {
    let h = Harness::new();
    h.polymarket.set("a", event("a", "0.10"));
    h.engine.add_tracked(Provider::Polymarket, "a").await.unwrap();
    h.engine.refresh_tracked(Provider::Polymarket).await;
    h.polymarket.set("a", event("a", "0.30"));
    h.engine.refresh_tracked(Provider::Polymarket).await;

    assert!(h.engine.remove_tracked(Provider::Polymarket, "a").await);
    assert!(h.engine.tracked_snapshot(Provider::Polymarket).await.is_empty());
    assert!(h.engine.alerts_snapshot().contains_key("a"));

    h.clock.advance_ms(10_000);
    h.engine.sweep_alerts().await;
    assert!(h.engine.alerts_snapshot().contains_key("a"));

    h.clock.advance_ms(1);
    h.engine.sweep_alerts().await;
    assert!(h.engine.alerts_snapshot().is_empty());
}

#[tokio::test]
async fn test_sweep_without_expiry_keeps_same_snapshot() {
    let h = Harness::new();
    let first = h.engine.sweep_alerts().await;
    let second = h.engine.sweep_alerts().await;
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_provider_failure_clears_only_that_provider() {
    let h = Harness::new();
    h.polymarket.set("a", event("a", "0.40"));
    h.kalshi.set("KXA", market("KXA", 40));
    h.engine.add_tracked(Provider::Polymarket, "a").await.unwrap();
    h.engine.add_tracked(Provider::Kalshi, "kxa").await.unwrap();

    h.engine.refresh_tracked(Provider::Polymarket).await;
    h.engine.refresh_tracked(Provider::Kalshi).await;
    assert_eq!(h.tracked_ids(Provider::Kalshi).await, vec!["KXA"]);

    h.kalshi.set_failing(true);
    h.engine.refresh_tracked(Provider::Kalshi).await;

    assert!(h.engine.tracked_snapshot(Provider::Kalshi).await.is_empty());
    assert_eq!(h.tracked_ids(Provider::Polymarket).await, vec!["a"]);
    assert_eq!(h.engine.tracked_ids(Provider::Kalshi).await, vec!["KXA"]);
}

#[tokio::test]
async fn test_failed_cycle_keeps_detection_history() {
    let h = Harness::new();
    h.kalshi.set("KXA", market("KXA", 40));
    h.engine.add_tracked(Provider::Kalshi, "KXA").await.unwrap();
    h.engine.refresh_tracked(Provider::Kalshi).await;

    h.kalshi.set_failing(true);
    h.engine.refresh_tracked(Provider::Kalshi).await;

    // next good sample diffs against the last good one
    h.kalshi.set_failing(false);
    h.kalshi.set("KXA", market("KXA", 46));
    let detection = h.engine.refresh_tracked(Provider::Kalshi).await.unwrap();
    assert_eq!(detection.crossings.len(), 1);
    assert_eq!(detection.crossings[0].previous, dec!(0.40));
}

#[tokio::test]
async fn test_trending_refresh_and_failure() {
    let h = Harness::new();
    h.polymarket
        .set_trending(vec![event("a", "0.40"), event("b", "0.90")]);

    h.engine.refresh_trending(Provider::Polymarket).await;
    let trending = h.engine.trending_snapshot(Provider::Polymarket).await;
    assert_eq!(trending.len(), 2);
    assert_eq!(trending[1].top_prob(), Some(dec!(0.90)));

    h.polymarket.set_failing(true);
    h.engine.refresh_trending(Provider::Polymarket).await;
    assert!(h.engine.trending_snapshot(Provider::Polymarket).await.is_empty());
    assert!(h.engine.trending_snapshot(Provider::Kalshi).await.is_empty());
}

#[tokio::test]
async fn test_trending_never_alerts() {
    let h = Harness::new();
    h.polymarket.set_trending(vec![event("a", "0.10")]);
    h.engine.refresh_trending(Provider::Polymarket).await;
    h.polymarket.set_trending(vec![event("a", "0.90")]);
    h.engine.refresh_trending(Provider::Polymarket).await;

    assert!(h.engine.alerts_snapshot().is_empty());
    assert_eq!(h.notifier.calls(), 0);
}

#[tokio::test]
async fn test_subscribers_see_published_alerts() {
    let h = Harness::new();
    let mut rx = h.engine.subscribe_alerts();
    h.kalshi.set("KXA", market("KXA", 20));
    h.engine.add_tracked(Provider::Kalshi, "KXA").await.unwrap();
    h.engine.refresh_tracked(Provider::Kalshi).await;
    assert!(!rx.has_changed().unwrap());

    h.kalshi.set("KXA", market("KXA", 31));
    h.engine.refresh_tracked(Provider::Kalshi).await;

    assert!(rx.has_changed().unwrap());
    let alerts = rx.borrow_and_update().clone();
    assert_eq!(alerts["KXA"].message, "Sudden change! Top option moved by 11.0%");
}

#[tokio::test(start_paused = true)]
async fn test_stale_batch_is_discarded() {
    let h = Harness::new();
    h.polymarket.set("a", event("a", "0.40"));
    h.polymarket.set("b", event("b", "0.50"));
    h.engine.add_tracked(Provider::Polymarket, "a").await.unwrap();
    h.polymarket.set_delay(Duration::from_secs(1));

    let engine = h.engine.clone();
    let in_flight = tokio::spawn(async move { engine.refresh_tracked(Provider::Polymarket).await });
    tokio::time::sleep(Duration::from_millis(10)).await;

    h.engine.add_tracked(Provider::Polymarket, "b").await.unwrap();
    let result = in_flight.await.unwrap();

    assert!(result.is_none());
    assert!(h.engine.tracked_snapshot(Provider::Polymarket).await.is_empty());
}

#[tokio::test]
async fn test_add_rejects_blank_and_duplicate() {
    let h = Harness::new();
    tokio_test::assert_err!(h.engine.add_tracked(Provider::Polymarket, "   ").await);
    assert!(h
        .engine
        .add_tracked(Provider::Polymarket, "https://polymarket.com/event/fed-decision/")
        .await
        .unwrap());
    assert!(!h.engine.add_tracked(Provider::Polymarket, "fed-decision").await.unwrap());
    assert_eq!(h.engine.tracked_ids(Provider::Polymarket).await, vec!["fed-decision"]);
}
