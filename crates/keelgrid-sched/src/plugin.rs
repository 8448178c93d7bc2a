//! Filter plugin extension points.
//!
//! One scheduling attempt drives a plugin through: `pre_filter` once for
//! the pod, `filter` once per candidate node, and, during preemption
//! simulation, `on_speculative_add` / `on_speculative_remove` as the
//! scheduler hypothesizes moving other pods on or off a node.

use keelgrid_state::{NodeInfo, Pod};

use crate::cycle_state::CycleState;
use crate::error::SchedResult;
use crate::events::{ClusterEvent, EventInterest, QueueingHint};

/// Base trait for all scheduler plugins.
pub trait Plugin: Send + Sync {
    /// Stable plugin name, used for registry keys and logs.
    fn name(&self) -> &'static str;
}

/// Outcome of the pre-filter extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreFilterResult {
    /// State was computed; per-node filtering should proceed.
    Proceed,
    /// The plugin is irrelevant to this pod for the whole attempt. The
    /// framework must not invoke the plugin's filter on any node; this is
    /// a distinct short-circuit, not an always-pass filter.
    Skip,
}

/// Outcome of one per-node filter evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Placement on the node is allowed as far as this plugin is concerned.
    Admit,
    /// Placement is forbidden, with a stable human-readable reason.
    Reject(&'static str),
}

impl Verdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, Verdict::Admit)
    }
}

/// Computes per-attempt state before node fan-out and keeps it current
/// during preemption simulation.
pub trait PreFilterPlugin: Plugin {
    /// Compute and store per-attempt state for `pod`.
    ///
    /// A claim-lookup error with not-found (see
    /// [`SchedError::is_claim_not_found`](crate::SchedError::is_claim_not_found))
    /// means the pod is unschedulable until the claim is created; other
    /// errors are transient and retryable at the caller's discretion.
    fn pre_filter(&self, cycle: &mut CycleState, pod: &Pod) -> SchedResult<PreFilterResult>;

    /// Update per-attempt state as if `other` were added to the cluster.
    fn on_speculative_add(
        &self,
        cycle: &mut CycleState,
        pod: &Pod,
        other: &Pod,
    ) -> SchedResult<()>;

    /// Update per-attempt state as if `other` were removed from the
    /// cluster. Must exactly undo a matching `on_speculative_add`.
    fn on_speculative_remove(
        &self,
        cycle: &mut CycleState,
        pod: &Pod,
        other: &Pod,
    ) -> SchedResult<()>;
}

/// Decides per node whether placing the pod is forbidden.
pub trait FilterPlugin: Plugin {
    /// Evaluate `pod` against one candidate node. Reads the per-attempt
    /// state written by pre-filter; concurrent invocations for different
    /// nodes share the same `&CycleState`.
    fn filter(&self, cycle: &CycleState, pod: &Pod, node: &NodeInfo) -> SchedResult<Verdict>;
}

/// Supplies the retry queue with event interests and refinement hints.
pub trait EnqueuePlugin: Plugin {
    /// Event kinds that may flip one of this plugin's rejections.
    fn event_interests(&self) -> Vec<EventInterest>;

    /// Refinement hint for a hinted event kind. The queue maps an error
    /// to [`QueueingHint::Queue`] (paired with the error in logs), never
    /// silently dropping the pod.
    fn queueing_hint(&self, pod: &Pod, event: &ClusterEvent) -> SchedResult<QueueingHint>;
}
