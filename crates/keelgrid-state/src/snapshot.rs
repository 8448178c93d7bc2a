//! Per-cycle cluster snapshot — read-optimized assignment state.
//!
//! Built once at the start of a scheduling cycle from the pods currently
//! assigned to nodes, then read concurrently by filter evaluations. The
//! snapshot is never mutated during a cycle; staleness relative to live
//! cluster state is bounded by the cycle length.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::types::{NodeId, Pod};

/// Read access to cluster assignment state during one scheduling cycle.
pub trait ClusterSnapshot: Send + Sync {
    /// True if some currently scheduled pod anywhere in the cluster uses
    /// the claim. Exclusive-mode claims admit at most one holder, so a
    /// boolean answer suffices.
    fn is_claim_in_use(&self, namespace: &str, name: &str) -> bool;

    /// The resident-pod view of a node, or `None` if the node is unknown.
    fn node(&self, node_id: &str) -> Option<&NodeInfo>;
}

/// A node plus the pods currently assigned to it.
#[derive(Debug, Clone, Default)]
pub struct NodeInfo {
    pub node_id: NodeId,
    /// Pods resident on the node, in assignment order.
    pub pods: Vec<Pod>,
}

impl NodeInfo {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            pods: Vec::new(),
        }
    }

    /// Synthetic single-pod view, used to replay a departed pod's volumes
    /// as if they were still mounted somewhere.
    pub fn with_pod(pod: Pod) -> Self {
        Self {
            node_id: pod.node_name.clone().unwrap_or_default(),
            pods: vec![pod],
        }
    }

    pub fn add_pod(&mut self, pod: Pod) {
        self.pods.push(pod);
    }
}

/// Concrete snapshot: per-node resident pods plus an O(1) index of claims
/// held by scheduled pods, keyed `{namespace}/{name}`.
#[derive(Debug, Default)]
pub struct Snapshot {
    nodes: HashMap<NodeId, NodeInfo>,
    claims_in_use: HashSet<String>,
}

impl Snapshot {
    /// Build a snapshot from the pods of one cycle.
    ///
    /// Pods without a node assignment are ignored: they hold nothing yet.
    pub fn build(pods: impl IntoIterator<Item = Pod>) -> Self {
        let mut nodes: HashMap<NodeId, NodeInfo> = HashMap::new();
        let mut claims_in_use = HashSet::new();

        for pod in pods {
            let Some(node_id) = pod.node_name.clone() else {
                continue;
            };
            for claim_name in pod.spec.claim_names() {
                claims_in_use.insert(format!("{}/{claim_name}", pod.namespace));
            }
            nodes
                .entry(node_id.clone())
                .or_insert_with(|| NodeInfo::new(node_id))
                .add_pod(pod);
        }

        debug!(
            nodes = nodes.len(),
            claims_in_use = claims_in_use.len(),
            "cluster snapshot built"
        );

        Self {
            nodes,
            claims_in_use,
        }
    }

    /// Iterate the per-node views in the snapshot.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.values()
    }
}

impl ClusterSnapshot for Snapshot {
    fn is_claim_in_use(&self, namespace: &str, name: &str) -> bool {
        self.claims_in_use.contains(&format!("{namespace}/{name}"))
    }

    fn node(&self, node_id: &str) -> Option<&NodeInfo> {
        self.nodes.get(node_id)
    }
}
