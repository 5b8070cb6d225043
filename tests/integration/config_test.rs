//! Example configuration stays loadable

use odds_watch::config::{Config, NotifierKind};
use odds_watch::engine::Engine;
use odds_watch::market::Provider;
use rust_decimal_macros::dec;
use std::io::Write;

const EXAMPLE: &str = include_str!("../../config.toml.example");

#[test]
fn test_example_config_parses() {
    let config: Config = toml::from_str(EXAMPLE).unwrap();
    assert_eq!(config.alerts.threshold, dec!(0.05));
    assert_eq!(config.alerts.ttl_ms, 10_000);
    assert_eq!(config.scheduler.trending_interval_ms, 300_000);
    assert_eq!(config.scheduler.tracked_interval_ms, 15_000);
    assert_eq!(config.scheduler.sweep_interval_ms, 2_000);
    assert_eq!(config.notifier.kind, NotifierKind::Bell);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(EXAMPLE.as_bytes()).unwrap();
    tokio_test::assert_ok!(Config::load(file.path()));
}

#[tokio::test]
async fn test_watchlist_from_config_seeds_engine() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[watchlist]\npolymarket = [\"https://polymarket.com/event/fed-decision\"]\nkalshi = [\"kxfed\"]"
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let engine = Engine::new(config).unwrap();
    assert_eq!(engine.tracked_ids(Provider::Polymarket).await, vec!["fed-decision"]);
    assert_eq!(engine.tracked_ids(Provider::Kalshi).await, vec!["KXFED"]);
}
