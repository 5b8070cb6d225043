//! Delta detection module
//!
//! Remembers the last top-outcome probability per id and raises an alert
//! when consecutive observations differ by at least the threshold.

mod detector;
mod types;

pub use detector::{move_message, DeltaDetector, DEFAULT_THRESHOLD};
pub use types::{Crossing, Detection};
