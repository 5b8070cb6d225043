//! Adapter error types

use rust_decimal::Decimal;
use thiserror::Error;

/// Failure to read a provider record's embedded fields
#[derive(Debug, Error)]
pub enum ParseError {
    /// A JSON-encoded string field could not be decoded
    #[error("malformed {field}: {source}")]
    MalformedField {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A decoded number lies outside the range the field allows
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: Decimal },
    /// Arithmetic on raw integer fields overflowed
    #[error("{field} overflowed")]
    Overflow { field: &'static str },
}
