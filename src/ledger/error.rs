//! Failure kinds surfaced by the ledger store.

use thiserror::Error;

/// Callers distinguish cases by variant; driver-level failures collapse
/// into `Database`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found in storage")]
    NotFound,

    #[error("{0}: already exists")]
    AlreadyExists(String),

    #[error("order {0} was uploaded by another user")]
    AlreadyExistsForOtherUser(String),

    #[error("not enough funds are available")]
    InsufficientFunds,

    #[error("deadline exceeded before the store answered")]
    Timeout,

    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),

    #[error("could not decode stored row: {0}")]
    Scan(String),
}
