//! Polymarket event normalization
//!
//! Gamma events come in three shapes:
//! - grouped events with several sub-markets, one outcome per sub-market
//! - single-market events whose outcomes and prices are JSON-encoded arrays
//! - bare records carrying only a top-level `outcomePrices` array

use super::{Adapter, ParseError};
use crate::market::{GammaEvent, GammaMarket, Outcome, Provider};
use crate::watchlist::WatchlistError;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Path segment preceding the slug in pasted event URLs
const EVENT_PATH: &str = "/event/";

/// Adapter for Gamma API events
#[derive(Debug, Clone, Copy, Default)]
pub struct PolymarketAdapter;

impl Adapter for PolymarketAdapter {
    type Raw = GammaEvent;

    const PROVIDER: Provider = Provider::Polymarket;

    fn record_id<'a>(&self, event: &'a GammaEvent) -> &'a str {
        &event.slug
    }

    fn title<'a>(&self, event: &'a GammaEvent) -> &'a str {
        &event.title
    }

    fn volume(&self, event: &GammaEvent) -> Decimal {
        event.volume.unwrap_or(Decimal::ZERO)
    }

    fn parse_outcomes(&self, event: &GammaEvent) -> Result<Vec<Outcome>, ParseError> {
        match event.markets.as_deref() {
            Some(markets) if markets.len() > 1 => markets.iter().map(grouped_outcome).collect(),
            Some([market]) => binary_outcomes(market),
            _ => match &event.outcome_prices {
                Some(raw) => {
                    let prices = parse_prices(raw)?;
                    let prob = prices.first().copied().flatten().unwrap_or(Decimal::ZERO);
                    let change = event.one_day_price_change.unwrap_or(Decimal::ZERO);
                    Ok(vec![Outcome::new("Yes", prob, Some(change))])
                }
                None => Ok(vec![]),
            },
        }
    }

    fn normalize_id(&self, input: &str) -> Result<String, WatchlistError> {
        let mut slug = input.trim();
        if let Some(pos) = slug.rfind(EVENT_PATH) {
            slug = &slug[pos + EVENT_PATH.len()..];
        }
        if let Some(end) = slug.find(|c: char| c == '?' || c == '#') {
            slug = &slug[..end];
        }
        let slug = slug.trim_end_matches('/');

        if slug.is_empty() {
            return Err(WatchlistError::EmptyId);
        }
        Ok(slug.to_string())
    }
}

/// One outcome for a sub-market of a grouped event
///
/// Probability falls back from the first serialized price to the last
/// traded price, then to zero.
fn grouped_outcome(market: &GammaMarket) -> Result<Outcome, ParseError> {
    let serialized = match &market.outcome_prices {
        Some(raw) => parse_prices(raw)?.first().copied().flatten(),
        None => None,
    };
    let prob = serialized
        .or(market.last_trade_price)
        .unwrap_or(Decimal::ZERO);

    let label = [&market.group_item_title, &market.question]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(String::as_str)
        .unwrap_or("Yes");

    let change = market.one_day_price_change.unwrap_or(Decimal::ZERO);
    Ok(Outcome::new(label, prob, Some(change)))
}

/// Outcomes of a single-market event
///
/// With more than two labels, "No" entries are dropped so only the
/// affirmative choices compete for the top slot.
fn binary_outcomes(market: &GammaMarket) -> Result<Vec<Outcome>, ParseError> {
    let labels = match &market.outcomes {
        Some(raw) => parse_labels(raw)?,
        None => vec!["Yes".to_string()],
    };
    let prices = match &market.outcome_prices {
        Some(raw) => parse_prices(raw)?,
        None => vec![Some(market.last_trade_price.unwrap_or(Decimal::ZERO))],
    };

    let multi_choice = labels.len() > 2;
    let outcomes = labels
        .into_iter()
        .enumerate()
        .filter(|(_, label)| !(multi_choice && label == "No"))
        .map(|(i, label)| {
            let prob = prices.get(i).copied().flatten().unwrap_or(Decimal::ZERO);
            let change = (i == 0).then(|| market.one_day_price_change.unwrap_or(Decimal::ZERO));
            Outcome::new(label, prob, change)
        })
        .collect();

    Ok(outcomes)
}

/// Decode a JSON-encoded label array, e.g. `["Yes", "No"]`
fn parse_labels(raw: &str) -> Result<Vec<String>, ParseError> {
    serde_json::from_str(raw).map_err(|source| ParseError::MalformedField {
        field: "outcomes",
        source,
    })
}

/// Decode a JSON-encoded price array, e.g. `["0.52", "0.48"]`
///
/// Entries that are not numeric come back as `None`.
fn parse_prices(raw: &str) -> Result<Vec<Option<Decimal>>, ParseError> {
    let values: Vec<Value> =
        serde_json::from_str(raw).map_err(|source| ParseError::MalformedField {
            field: "outcomePrices",
            source,
        })?;
    Ok(values.iter().map(price_value).collect())
}

fn price_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
