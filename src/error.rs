//! Domain-specific errors for the wallet ledger.
//!
//! Contains error variants for the failure cases callers have to handle:
//! - Lookups of ids that do not exist (payment methods, transactions)
//! - The persistent store being unreadable, unwritable or too slow
//! - Malformed records and filters (negative amounts, empty labels, bad ranges)
//! - A persisted payment method collection that already has two defaults
//!
//! Errors are always returned to the immediate caller. Nothing in this crate
//! recovers silently except the deduplication performed by the seeder.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("user {user_id} has more than one default payment method")]
    DuplicateDefault { user_id: String },
}

impl Error {
    pub(crate) fn payment_method_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            entity: "payment method",
            id: id.into(),
        }
    }

    pub(crate) fn transaction_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            entity: "transaction",
            id: id.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::StorageUnavailable(format!("serialization failed: {e}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
