//! Kalshi market normalization
//!
//! Kalshi quotes prices in cents; every market is a single "Yes" outcome.

use super::{Adapter, ParseError};
use crate::market::{KalshiMarket, Outcome, Provider};
use crate::watchlist::WatchlistError;
use rust_decimal::Decimal;

/// Adapter for Kalshi trade API markets
#[derive(Debug, Clone, Copy, Default)]
pub struct KalshiAdapter;

impl Adapter for KalshiAdapter {
    type Raw = KalshiMarket;

    const PROVIDER: Provider = Provider::Kalshi;

    fn record_id<'a>(&self, market: &'a KalshiMarket) -> &'a str {
        &market.ticker
    }

    fn title<'a>(&self, market: &'a KalshiMarket) -> &'a str {
        &market.title
    }

    fn volume(&self, market: &KalshiMarket) -> Decimal {
        let contracts = market
            .volume_24h
            .filter(|v| *v > 0)
            .or(market.volume)
            .unwrap_or(0);
        Decimal::from(contracts)
    }

    fn parse_outcomes(&self, market: &KalshiMarket) -> Result<Vec<Outcome>, ParseError> {
        // An empty book reports a zero bid, fall back to the last trade
        let cents = match market.yes_bid {
            Some(bid) if bid != 0 => Some(bid),
            _ => market.last_price,
        };
        let prob = cents.map(cents_to_prob).unwrap_or(Decimal::ZERO);

        let change = match (market.yes_bid, market.previous_yes_bid) {
            (Some(bid), Some(previous)) => {
                let cents = bid.checked_sub(previous).ok_or(ParseError::Overflow {
                    field: "previous_yes_bid",
                })?;
                Some(cents_to_prob(cents))
            }
            _ => None,
        };

        Ok(vec![Outcome::new("Yes", prob, change)])
    }

    fn normalize_id(&self, input: &str) -> Result<String, WatchlistError> {
        let ticker = input.trim();
        if ticker.is_empty() {
            return Err(WatchlistError::EmptyId);
        }
        Ok(ticker.to_uppercase())
    }
}

fn cents_to_prob(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
