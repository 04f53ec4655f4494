//! The module contains the errors the engine can throw.
//!
//! The taxonomy follows the request path: authorization failures and missing
//! records surface verbatim, settlement failures abort the whole command, and
//! database faults are opaque to callers.

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The caller is authenticated but is not allowed to act on the record.
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" not found!")]
    KeyNotFound(String),
    /// Malformed payload, invalid state for the requested action, or an
    /// out-of-range field.
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("insufficient credits: {0}")]
    InsufficientFunds(String),
    /// A ledger mutation failed while compensating a partial operation. The
    /// credit account and the reading record may need manual reconciliation.
    #[error("settlement conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
