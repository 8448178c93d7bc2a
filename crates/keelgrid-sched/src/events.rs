//! Cluster change events and queueing hints.
//!
//! A pod rejected by filtering waits in a retry queue. Rather than blindly
//! re-filtering on every cluster change, plugins register interest in the
//! event kinds that could flip one of their rejections, optionally with a
//! refinement hint the queue consults before waking the pod.

use serde::{Deserialize, Serialize};

use keelgrid_state::{Claim, NodeId, Pod};

/// A cluster state transition redistributed to interested plugins.
#[derive(Debug, Clone)]
pub enum ClusterEvent {
    /// A pod was removed from the cluster. Carries the pod's last state.
    PodDeleted { pod: Pod },
    /// A claim was created (`old` is `None`) or updated.
    ClaimChanged { old: Option<Claim>, new: Claim },
    /// A node joined the cluster.
    NodeAdded { node_id: NodeId },
}

impl ClusterEvent {
    /// The registration kind this event matches.
    pub fn kind(&self) -> ClusterEventKind {
        match self {
            ClusterEvent::PodDeleted { .. } => ClusterEventKind::PodDeleted,
            ClusterEvent::ClaimChanged { old: None, .. } => ClusterEventKind::ClaimAdded,
            ClusterEvent::ClaimChanged { old: Some(_), .. } => ClusterEventKind::ClaimUpdated,
            ClusterEvent::NodeAdded { .. } => ClusterEventKind::NodeAdded,
        }
    }
}

/// Event kinds plugins can register interest in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterEventKind {
    PodDeleted,
    ClaimAdded,
    ClaimUpdated,
    NodeAdded,
}

/// A plugin's registered interest in one event kind.
///
/// `hinted` interests are refined through the plugin's queueing hint;
/// unhinted interests wake every pod the plugin rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInterest {
    pub kind: ClusterEventKind,
    pub hinted: bool,
}

impl EventInterest {
    pub fn hinted(kind: ClusterEventKind) -> Self {
        Self { kind, hinted: true }
    }

    pub fn unhinted(kind: ClusterEventKind) -> Self {
        Self {
            kind,
            hinted: false,
        }
    }
}

/// Whether a rejected pod should be moved back to the active queue.
///
/// Hints must stay conservative: when in doubt, `Queue`. The retry queue
/// also maps hint *errors* to `Queue`, since a missed wake-up strands a
/// pod while a spurious one only costs a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueingHint {
    /// The event may have made the pod schedulable; retry it.
    Queue,
    /// The event cannot have helped this pod; keep it waiting.
    Skip,
}
