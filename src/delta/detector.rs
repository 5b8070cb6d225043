//! Delta detector
//!
//! History lives for the detector's lifetime: entries are created on first
//! observation, overwritten on every observation, and never removed, even
//! after an id leaves the watchlist.

use super::{Crossing, Detection};
use crate::adapter::Adapter;
use crate::alert::{Alert, AlertStore};
use crate::notify::Notifier;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

/// Default alert threshold: a 5 point move of the top outcome
pub const DEFAULT_THRESHOLD: Decimal = dec!(0.05);

/// Compares each observation against the previous one per id
pub struct DeltaDetector {
    threshold: Decimal,
    history: HashMap<String, Decimal>,
    notifier: Arc<dyn Notifier>,
}

impl DeltaDetector {
    /// Create a detector with the given inclusive threshold
    pub fn new(threshold: Decimal, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            threshold,
            history: HashMap::new(),
            notifier,
        }
    }

    /// Create a detector with [`DEFAULT_THRESHOLD`]
    pub fn with_defaults(notifier: Arc<dyn Notifier>) -> Self {
        Self::new(DEFAULT_THRESHOLD, notifier)
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    /// Last observed top-outcome probability for an id
    pub fn last_observed(&self, id: &str) -> Option<Decimal> {
        self.history.get(id).copied()
    }

    /// Run one detection pass over a batch, in batch order
    ///
    /// Records without outcomes are skipped and leave history untouched.
    /// Every crossing id gets its own alert; the notifier fires at most once
    /// per call no matter how many ids crossed.
    pub fn detect<A: Adapter>(
        &mut self,
        adapter: &A,
        batch: &[A::Raw],
        alerts: &mut AlertStore,
        now: DateTime<Utc>,
    ) -> Detection {
        let mut detection = Detection::default();
        let mut raised = Vec::new();

        for record in batch {
            let id = adapter.record_id(record);
            let Some(top) = adapter.outcomes(record).first().map(|o| o.prob) else {
                continue;
            };
            detection.observed += 1;

            if let Some(previous) = self.history.get(id).copied() {
                let Some(diff) = top.checked_sub(previous).map(|d| d.abs()) else {
                    tracing::warn!(provider = %A::PROVIDER, id = id, "Skipping unrepresentable move");
                    continue;
                };

                if diff >= self.threshold {
                    tracing::info!(
                        provider = %A::PROVIDER,
                        id = id,
                        previous = %previous,
                        current = %top,
                        "Top outcome moved past threshold"
                    );
                    raised.push(Alert::new(id, move_message(diff), now));
                    detection.crossings.push(Crossing {
                        id: id.to_string(),
                        previous,
                        current: top,
                        diff,
                    });

                    if !detection.notified {
                        self.notifier.play_alert();
                        detection.notified = true;
                    }
                }
            }

            self.history.insert(id.to_string(), top);
        }

        alerts.raise_all(raised);
        detection
    }
}

/// Alert text for a move, as a percentage with one decimal
pub fn move_message(diff: Decimal) -> String {
    let Some(pct) = diff.checked_mul(dec!(100)) else {
        return "Sudden change! Top option moved by more than 100%".to_string();
    };
    let mut pct = pct.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    pct.rescale(1);
    format!("Sudden change! Top option moved by {}%", pct)
}
