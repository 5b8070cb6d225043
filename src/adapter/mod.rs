//! Provider adapters
//!
//! Each adapter turns one raw provider record into a canonical [`Entity`]
//! and owns the provider's rule for cleaning up user-entered ids.

mod kalshi;
mod polymarket;
mod types;

pub use kalshi::KalshiAdapter;
pub use polymarket::PolymarketAdapter;
pub use types::ParseError;

use crate::market::{Entity, Outcome, Provider};
use crate::watchlist::WatchlistError;
use rust_decimal::Decimal;

/// Maximum number of outcomes kept per entity
pub const MAX_OUTCOMES: usize = 3;

/// Normalization rules for one provider's raw records
pub trait Adapter: Send + Sync + 'static {
    /// Raw record type produced by the provider's fetch layer
    type Raw: Send + Sync + 'static;

    /// Provider this adapter handles
    const PROVIDER: Provider;

    /// Tracking id of a record (slug or ticker)
    fn record_id<'a>(&self, raw: &'a Self::Raw) -> &'a str;

    fn title<'a>(&self, raw: &'a Self::Raw) -> &'a str;

    fn volume(&self, raw: &Self::Raw) -> Decimal;

    /// Extract unranked outcomes, failing on malformed embedded fields
    fn parse_outcomes(&self, raw: &Self::Raw) -> Result<Vec<Outcome>, ParseError>;

    /// Clean up a user-entered id before it reaches the watchlist
    fn normalize_id(&self, input: &str) -> Result<String, WatchlistError>;

    /// Ranked outcomes; a parse or range failure yields an empty list
    fn outcomes(&self, raw: &Self::Raw) -> Vec<Outcome> {
        match self.parse_outcomes(raw).and_then(check_ranges) {
            Ok(mut outcomes) => {
                rank_outcomes(&mut outcomes);
                outcomes
            }
            Err(e) => {
                tracing::debug!(
                    provider = %Self::PROVIDER,
                    id = self.record_id(raw),
                    error = %e,
                    "Dropping outcomes of malformed record"
                );
                Vec::new()
            }
        }
    }

    /// Normalize a raw record into the canonical shape
    fn normalize(&self, raw: &Self::Raw) -> Entity {
        Entity {
            id: self.record_id(raw).to_string(),
            title: self.title(raw).to_string(),
            outcomes: self.outcomes(raw),
            volume: self.volume(raw),
        }
    }
}

/// Reject probabilities outside [0, 1] and changes outside [-1, 1]
pub fn check_ranges(outcomes: Vec<Outcome>) -> Result<Vec<Outcome>, ParseError> {
    for outcome in &outcomes {
        if outcome.prob < Decimal::ZERO || outcome.prob > Decimal::ONE {
            return Err(ParseError::OutOfRange {
                field: "prob",
                value: outcome.prob,
            });
        }
        if let Some(change) = outcome.change.filter(|c| c.abs() > Decimal::ONE) {
            return Err(ParseError::OutOfRange {
                field: "change",
                value: change,
            });
        }
    }
    Ok(outcomes)
}

/// Sort by probability descending and keep the top [`MAX_OUTCOMES`]
pub fn rank_outcomes(outcomes: &mut Vec<Outcome>) {
    outcomes.sort_by(|a, b| b.prob.cmp(&a.prob));
    outcomes.truncate(MAX_OUTCOMES);
}
