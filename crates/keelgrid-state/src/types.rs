//! Domain types for the KeelGrid cluster object model.
//!
//! These types describe the slice of cluster state the placement filters
//! operate on: pods and their declared volumes, persistent claims with
//! their access modes, and node identity. All types are serializable
//! to/from JSON for state replication and test fixtures.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node in the cluster.
pub type NodeId = String;

/// Name of a persistent claim, unique within its namespace.
pub type ClaimName = String;

// ── Pod ───────────────────────────────────────────────────────────

/// A workload unit as seen by the placement engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pod {
    pub name: String,
    pub namespace: String,
    /// Node the pod is assigned to, if already scheduled.
    pub node_name: Option<NodeId>,
    pub spec: PodSpec,
}

/// The declared specification of a pod.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PodSpec {
    /// Ordered sequence of volume declarations.
    pub volumes: Vec<Volume>,
}

impl Pod {
    /// Composite `{namespace}/{name}` key used in indexes and logs.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl PodSpec {
    /// Names of the claims referenced by this pod's claim-backed volumes,
    /// in declaration order.
    pub fn claim_names(&self) -> impl Iterator<Item = &str> {
        self.volumes.iter().filter_map(|v| match &v.source {
            VolumeSource::Claim { claim_name } => Some(claim_name.as_str()),
            _ => None,
        })
    }
}

// ── Volume ────────────────────────────────────────────────────────

/// A single volume declaration in a pod spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Volume {
    /// Name of the volume within the pod spec.
    pub name: String,
    pub source: VolumeSource,
}

/// Storage backend for a volume.
///
/// The first four kinds participate in pairwise conflict checks during
/// filtering; `Claim` references a persistent claim in the pod's own
/// namespace; the remaining kinds are inert to placement restrictions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VolumeSource {
    /// Network-attached block disk, identified by provider disk name.
    BlockDisk { disk_name: String, read_only: bool },
    /// Provider-managed block storage addressed by opaque volume id.
    BlockById { volume_id: String },
    /// Network storage target addressed by initiator-qualified name.
    NetworkTarget { iqn: String, read_only: bool },
    /// Replicated block image served by a monitor quorum.
    ReplicatedImage {
        monitors: Vec<String>,
        pool: String,
        image: String,
        read_only: bool,
    },
    /// Reference to a named persistent claim in the pod's namespace.
    Claim { claim_name: ClaimName },
    /// Node-local scratch storage.
    Ephemeral,
    /// Host filesystem mount.
    HostPath { path: String },
}

// ── Claim ─────────────────────────────────────────────────────────

/// A persistent storage claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub name: ClaimName,
    pub namespace: String,
    pub access_modes: Vec<AccessMode>,
}

/// How a claim may be mounted across the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Read-write by all pods on a single node.
    ReadWriteOnce,
    /// Read-only by any number of pods on any node.
    ReadOnlyMany,
    /// Read-write by any number of pods on any node.
    ReadWriteMany,
    /// Read-write by at most one pod cluster-wide.
    Exclusive,
}

impl Claim {
    /// Composite `{namespace}/{name}` key used in indexes and logs.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// True if the claim declares the exclusive access mode.
    pub fn is_exclusive(&self) -> bool {
        self.access_modes.contains(&AccessMode::Exclusive)
    }
}
