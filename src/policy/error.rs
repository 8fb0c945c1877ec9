//! Error types for policy storage

use thiserror::Error;

use crate::version::ParseVersionError;

/// Errors surfaced by policy store implementations.
///
/// A store failure is fatal to the current decision: it propagates to the
/// caller and is never treated as an empty table.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Invalid version in policy row: {0}")]
    InvalidVersion(#[from] ParseVersionError),

    #[error("Invalid expiry timestamp in policy row: {0}")]
    InvalidExpiry(#[from] chrono::ParseError),

    #[error("Unknown platform in policy row: {0:?}")]
    UnknownPlatform(String),
}
