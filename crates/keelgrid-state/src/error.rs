//! Error types for claim-store lookups.

use thiserror::Error;

/// Result type alias for claim-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during claim-store lookups.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced claim does not exist (yet). Callers classify this
    /// specially: a pod referencing a missing claim is unschedulable until
    /// the claim is created.
    #[error("claim {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// Transient backend failure; the caller decides retry policy.
    #[error("claim store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True if this is the not-found variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
