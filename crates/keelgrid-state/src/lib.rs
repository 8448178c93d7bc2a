//! keelgrid-state — cluster object model and scheduling snapshot.
//!
//! Provides the domain types the placement engine filters over (pods,
//! volumes, claims, nodes), the claim-store lookup seam, and the
//! read-optimized per-cycle [`Snapshot`] with its O(1) exclusive-usage
//! index.
//!
//! # Architecture
//!
//! The snapshot is built once per scheduling cycle from the pods currently
//! assigned to nodes and is read-only afterwards. Claim lookups go through
//! the [`ClaimStore`] trait so the scheduler can plug in its informer-backed
//! cache; [`InMemoryClaimStore`] backs tests and single-process runs.

pub mod error;
pub mod snapshot;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use snapshot::{ClusterSnapshot, NodeInfo, Snapshot};
pub use store::{ClaimStore, InMemoryClaimStore};
pub use types::*;
