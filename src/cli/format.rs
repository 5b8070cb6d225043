//! Plain-text rendering of entities and alerts

use crate::alert::Alert;
use crate::market::Entity;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::fmt::Write;

/// Probability as a percentage with one decimal, e.g. `42.5%`
pub fn format_prob(prob: Decimal) -> String {
    format!("{}%", percent(prob))
}

/// Signed daily change in percentage points, empty when unknown
pub fn format_change(change: Option<Decimal>) -> String {
    match change {
        Some(c) if c < Decimal::ZERO => percent(c).to_string(),
        Some(c) => format!("+{}", percent(c)),
        None => String::new(),
    }
}

fn percent(value: Decimal) -> Decimal {
    let mut pct =
        value.saturating_mul(dec!(100)).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    pct.rescale(1);
    pct
}

/// Title line followed by one indented line per outcome
pub fn format_entity(entity: &Entity) -> String {
    let mut out = format!("{}  [{}]  vol {}", entity.title, entity.id, entity.volume.round());
    for outcome in &entity.outcomes {
        let _ = write!(out, "\n    {:<32} {:>7}", outcome.label, format_prob(outcome.prob));
        let change = format_change(outcome.change);
        if !change.is_empty() {
            let _ = write!(out, "  ({} pts)", change);
        }
    }
    if entity.outcomes.is_empty() {
        out.push_str("\n    (no prices)");
    }
    out
}

/// One line per alert
pub fn format_alert(alert: &Alert) -> String {
    format!(
        "[{}] {}: {}",
        alert.timestamp.format("%H:%M:%S"),
        alert.id,
        alert.message
    )
}

/// Highest-volume entities first, at most `limit`
pub fn top_by_volume(mut entities: Vec<Entity>, limit: usize) -> Vec<Entity> {
    entities.sort_by(|a, b| b.volume.cmp(&a.volume));
    entities.truncate(limit);
    entities
}
