//! Watchlist of tracked ids for one provider
//!
//! Membership is exact-string and case-sensitive. Provider-specific cleanup
//! of user input happens before insertion, see
//! [`crate::adapter::Adapter::normalize_id`].

use thiserror::Error;

/// Watchlist errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WatchlistError {
    /// Input was blank after normalization
    #[error("tracked id is empty")]
    EmptyId,
}

/// Set of tracked ids, kept in insertion order for display
#[derive(Debug, Clone, Default)]
pub struct Watchlist {
    ids: Vec<String>,
}

impl Watchlist {
    /// Create an empty watchlist
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an id, returning false if it was already tracked
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove an id, returning false if it was not tracked
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|tracked| tracked != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|tracked| tracked == id)
    }

    /// Tracked ids in insertion order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
