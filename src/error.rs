//! Error taxonomy
//!
//! Affordability is not represented here: purchases and prestige report
//! failure with a `false` return.

use thiserror::Error;

/// Errors from numeric parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Input did not match the decimal/scientific number grammar
    #[error("malformed number: {0:?}")]
    MalformedNumber(String),
}

/// Errors surfaced by save loading, import and storage
#[derive(Debug, Error)]
pub enum SaveError {
    /// Structurally invalid input (not JSON, not an object, bad encoding, bad field type)
    #[error("malformed save: {0}")]
    Malformed(String),
    /// Well-formed input that this build cannot use (missing mandatory fields, newer schema)
    #[error("incompatible save: {0}")]
    Incompatible(String),
    /// Storage boundary failure
    #[error("save storage: {0}")]
    Io(#[from] std::io::Error),
}

impl SaveError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        SaveError::Malformed(msg.into())
    }

    pub(crate) fn incompatible(msg: impl Into<String>) -> Self {
        SaveError::Incompatible(msg.into())
    }
}
