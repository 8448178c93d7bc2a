//! Scheduling error types shared by the filter extension points.

use thiserror::Error;

use keelgrid_state::StoreError;

/// Result type alias for extension-point calls.
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors surfaced by filter plugins during a scheduling attempt.
#[derive(Debug, Error)]
pub enum SchedError {
    /// A claim lookup failed. The underlying store error is propagated
    /// unchanged; callers classify not-found specially via
    /// [`SchedError::is_claim_not_found`] (a pod referencing a missing
    /// claim is unresolvable until the claim appears, while transient
    /// backend failures are retryable).
    #[error("claim lookup failed: {0}")]
    ClaimLookup(#[from] StoreError),

    /// Pre-filter state was expected in the cycle but is absent. This is
    /// a contract violation between extension points and is fatal to the
    /// attempt; it is never recovered locally.
    #[error("cycle state slot {0:?} missing, pre-filter did not run")]
    StateMissing(&'static str),

    /// A queueing hint received an event it is not registered for. The
    /// retry queue treats hint errors as "requeue" so a malformed event
    /// can never silently strand a pod.
    #[error("unexpected event payload: {0}")]
    UnexpectedEvent(String),
}

impl SchedError {
    /// True if the error is a claim lookup that failed with not-found.
    pub fn is_claim_not_found(&self) -> bool {
        matches!(self, SchedError::ClaimLookup(err) if err.is_not_found())
    }
}
