//! Canonical market types shared by every provider

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upstream market provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Polymarket, via the Gamma API
    Polymarket,
    /// Kalshi, via the trade API v2
    Kalshi,
}

impl Provider {
    /// All providers, in display order
    pub const ALL: [Provider; 2] = [Provider::Polymarket, Provider::Kalshi];

    /// Lowercase name used in config, CLI and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Polymarket => "polymarket",
            Provider::Kalshi => "kalshi",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polymarket" | "poly" => Ok(Provider::Polymarket),
            "kalshi" => Ok(Provider::Kalshi),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

/// One ranked outcome of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Outcome label (e.g. "Yes" or a candidate name)
    pub label: String,
    /// Probability in [0, 1]
    pub prob: Decimal,
    /// Recent change in probability, when the provider reports one
    pub change: Option<Decimal>,
}

impl Outcome {
    /// Create a new outcome
    pub fn new(label: impl Into<String>, prob: Decimal, change: Option<Decimal>) -> Self {
        Self {
            label: label.into(),
            prob,
            change,
        }
    }
}

/// A provider record normalized into the canonical shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Provider-scoped tracking id (event slug or market ticker)
    pub id: String,
    /// Human readable title
    pub title: String,
    /// Outcomes, highest probability first, at most three
    pub outcomes: Vec<Outcome>,
    /// Traded volume
    pub volume: Decimal,
}

impl Entity {
    /// Probability of the leading outcome, if any
    pub fn top_prob(&self) -> Option<Decimal> {
        self.outcomes.first().map(|o| o.prob)
    }
}

/// Errors raised by the fetch layer
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// Transport or body decoding failure
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Upstream answered with a non-success status
    #[error("{provider} API error: {status} - {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },
}

impl FetchError {
    /// Whether the upstream reported the record as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}
