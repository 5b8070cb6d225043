//! Delta detection types

use rust_decimal::Decimal;

/// An id whose top outcome moved by at least the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crossing {
    pub id: String,
    pub previous: Decimal,
    pub current: Decimal,
    /// Absolute difference between the two observations
    pub diff: Decimal,
}

/// Result of one detection pass over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    /// Records that produced a top outcome and updated history
    pub observed: usize,
    /// Threshold crossings, in batch order
    pub crossings: Vec<Crossing>,
    /// Whether the notifier fired during this pass
    pub notified: bool,
}

impl Detection {
    pub fn has_alerts(&self) -> bool {
        !self.crossings.is_empty()
    }
}
