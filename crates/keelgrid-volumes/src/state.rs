//! Per-attempt pre-filter state for the volume restrictions filter.

use std::collections::HashSet;
use std::sync::Arc;

use keelgrid_state::{Pod, VolumeSource};

/// Cycle-state slot key for this plugin's pre-filter state. Derived from
/// the plugin name to avoid collisions with other plugins.
pub const STATE_KEY: &str = "pre-filter/volume-restrictions";

/// State computed once at pre-filter and read by every per-node filter
/// evaluation of the attempt.
///
/// The exclusive-claim set is immutable and shared between clones via
/// `Arc`; the conflicting-reference counter is owned per clone, so a
/// speculative simulation branch never corrupts its parent.
#[derive(Debug, Clone)]
pub struct PreFilterState {
    /// Names of the pod's claims using the exclusive access mode.
    exclusive_claims: Arc<HashSet<String>>,
    /// How many of those claims are already held by scheduled pods.
    conflicting_claim_refs: usize,
}

impl PreFilterState {
    pub(crate) fn new(exclusive_claims: HashSet<String>, conflicting_claim_refs: usize) -> Self {
        debug_assert!(conflicting_claim_refs <= exclusive_claims.len());
        Self {
            exclusive_claims: Arc::new(exclusive_claims),
            conflicting_claim_refs,
        }
    }

    /// Names of the pod's exclusive-mode claims.
    pub fn exclusive_claims(&self) -> &HashSet<String> {
        &self.exclusive_claims
    }

    /// Number of requested exclusive claims already held elsewhere. Zero
    /// means the pod may legally acquire every exclusive claim it
    /// requests; positive means no node can admit it until a claim frees.
    pub fn conflicting_claim_refs(&self) -> usize {
        self.conflicting_claim_refs
    }

    /// Update the counter as if `other` were added to the cluster.
    pub fn add_pod(&mut self, other: &Pod) {
        self.conflicting_claim_refs += self.matching_claim_refs(other);
    }

    /// Update the counter as if `other` were removed from the cluster.
    /// Exactly undoes a matching [`add_pod`](Self::add_pod).
    pub fn remove_pod(&mut self, other: &Pod) {
        self.conflicting_claim_refs = self
            .conflicting_claim_refs
            .saturating_sub(self.matching_claim_refs(other));
    }

    /// How many of `other`'s claim-backed volumes name one of this pod's
    /// exclusive claims. Counted per volume, matching the per-reference
    /// accounting of the snapshot index.
    fn matching_claim_refs(&self, other: &Pod) -> usize {
        other
            .spec
            .volumes
            .iter()
            .filter(|v| match &v.source {
                VolumeSource::Claim { claim_name } => self.exclusive_claims.contains(claim_name),
                _ => false,
            })
            .count()
    }
}
