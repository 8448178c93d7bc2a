//! The volume restrictions filter plugin.
//!
//! Evaluates whether a pod fits a node given the volumes it requests and
//! those already mounted there, and whether the pod's exclusive-access
//! claims are free anywhere in the cluster:
//! - block disks allow multiple mounts only when all of them are read-only
//! - by-id block storage forbids any two pods sharing a volume id
//! - network targets forbid a second writable mount of the same IQN
//! - replicated images forbid a second writable mount when monitor sets
//!   overlap and pool and image match
//! - a claim with the exclusive access mode already held by a scheduled
//!   pod blocks admission to every node until it is released

use std::collections::HashSet;
use std::sync::Arc;

use keelgrid_sched::{
    CycleState, FilterPlugin, Plugin, PreFilterPlugin, PreFilterResult, SchedError, SchedResult,
    Verdict,
};
use keelgrid_state::{ClaimStore, ClusterSnapshot, NodeInfo, Pod};

use crate::conflict::{needs_conflict_check, satisfies_volume_conflicts};
use crate::state::{PreFilterState, STATE_KEY};

/// Plugin name, used for registry keys and logs.
pub const NAME: &str = "volume-restrictions";

/// Reject reason when a requested volume conflicts with one already
/// mounted on the node.
pub const REASON_DISK_CONFLICT: &str = "node has a conflicting volume attachment";

/// Reject reason when an exclusive-access claim the pod requests is
/// already held by another pod.
pub const REASON_EXCLUSIVE_CLAIM_CONFLICT: &str =
    "exclusive-access claim is already in use by another pod";

/// The volume restrictions filter.
pub struct VolumeRestrictions {
    claims: Arc<dyn ClaimStore>,
    snapshot: Arc<dyn ClusterSnapshot>,
}

impl VolumeRestrictions {
    pub fn new(claims: Arc<dyn ClaimStore>, snapshot: Arc<dyn ClusterSnapshot>) -> Self {
        Self { claims, snapshot }
    }

    pub(crate) fn claims(&self) -> &dyn ClaimStore {
        &*self.claims
    }

    /// Names of the pod's claims that use the exclusive access mode.
    ///
    /// With `ignore_not_found`, missing claims are skipped instead of
    /// failing the resolution; used for pods already removed from
    /// consideration, where a stale reference must not block progress.
    pub(crate) fn exclusive_claims_for_pod(
        &self,
        pod: &Pod,
        ignore_not_found: bool,
    ) -> SchedResult<HashSet<String>> {
        let mut exclusive = HashSet::new();
        for claim_name in pod.spec.claim_names() {
            let claim = match self.claims.get(&pod.namespace, claim_name) {
                Ok(claim) => claim,
                Err(err) if err.is_not_found() && ignore_not_found => continue,
                Err(err) => return Err(err.into()),
            };
            if claim.is_exclusive() {
                exclusive.insert(claim.name);
            }
        }
        Ok(exclusive)
    }

    /// Build the pre-filter state: one index probe per exclusive claim.
    fn compute_state(&self, pod: &Pod, exclusive_claims: HashSet<String>) -> PreFilterState {
        // At most one pod can hold an exclusive claim, so every in-use
        // probe contributes exactly one conflicting reference.
        let conflicting = exclusive_claims
            .iter()
            .filter(|name| self.snapshot.is_claim_in_use(&pod.namespace, name.as_str()))
            .count();
        PreFilterState::new(exclusive_claims, conflicting)
    }

    /// Read this plugin's state from the cycle, mutably.
    fn state_mut<'a>(&self, cycle: &'a mut CycleState) -> SchedResult<&'a mut PreFilterState> {
        cycle
            .read_mut::<PreFilterState>(STATE_KEY)
            .ok_or(SchedError::StateMissing(STATE_KEY))
    }
}

/// The exclusive-claim half of the filter. An absent state entry means
/// the check was elided for this attempt and passes trivially.
fn satisfy_exclusive_claims(state: Option<&PreFilterState>) -> Verdict {
    match state {
        Some(state) if state.conflicting_claim_refs() > 0 => {
            Verdict::Reject(REASON_EXCLUSIVE_CLAIM_CONFLICT)
        }
        _ => Verdict::Admit,
    }
}

impl Plugin for VolumeRestrictions {
    fn name(&self) -> &'static str {
        NAME
    }
}

impl PreFilterPlugin for VolumeRestrictions {
    /// Resolve the pod's exclusive claims (strict), count how many are
    /// already held elsewhere, and stash the result for the per-node
    /// evaluations. When the pod has no conflict-relevant volumes and no
    /// exclusive-claim conflicts, the whole plugin is skipped for this
    /// attempt.
    fn pre_filter(&self, cycle: &mut CycleState, pod: &Pod) -> SchedResult<PreFilterResult> {
        let needs_check = pod.spec.volumes.iter().any(needs_conflict_check);

        let exclusive = self.exclusive_claims_for_pod(pod, false)?;
        let state = self.compute_state(pod, exclusive);

        if !needs_check && state.conflicting_claim_refs() == 0 {
            return Ok(PreFilterResult::Skip);
        }

        cycle.write(STATE_KEY, state);
        Ok(PreFilterResult::Proceed)
    }

    fn on_speculative_add(
        &self,
        cycle: &mut CycleState,
        _pod: &Pod,
        other: &Pod,
    ) -> SchedResult<()> {
        self.state_mut(cycle)?.add_pod(other);
        Ok(())
    }

    fn on_speculative_remove(
        &self,
        cycle: &mut CycleState,
        _pod: &Pod,
        other: &Pod,
    ) -> SchedResult<()> {
        self.state_mut(cycle)?.remove_pod(other);
        Ok(())
    }
}

impl FilterPlugin for VolumeRestrictions {
    /// Two independent checks, both of which must pass: the pairwise
    /// conflict sweep against the node's resident pods, then the
    /// cluster-wide exclusive-claim count computed at pre-filter.
    fn filter(&self, cycle: &CycleState, pod: &Pod, node: &NodeInfo) -> SchedResult<Verdict> {
        if !satisfies_volume_conflicts(pod, node) {
            return Ok(Verdict::Reject(REASON_DISK_CONFLICT));
        }

        let state = cycle
            .read::<PreFilterState>(STATE_KEY)
            .ok_or(SchedError::StateMissing(STATE_KEY))?;
        Ok(satisfy_exclusive_claims(Some(state)))
    }
}
