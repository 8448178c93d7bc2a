//! keelgrid-volumes — volume sharing restrictions for the placement filter.
//!
//! Decides whether placing a pod on a node would make two workloads
//! conflict over the same volume, and enforces the cluster-wide
//! single-writer guarantee for claims with the exclusive access mode.
//!
//! # Components
//!
//! - **`conflict`** — pairwise conflict rules over the four
//!   conflict-relevant volume backends
//! - **`state`** — the per-attempt pre-filter cache and its speculative
//!   add/remove updates for preemption simulation
//! - **`filter`** — the [`VolumeRestrictions`] plugin: exclusive-claim
//!   resolution, the elision fast path, and the two-check filter
//! - **`requeue`** — queueing hints that decide when a rejected pod is
//!   worth retrying

pub mod conflict;
pub mod filter;
pub mod requeue;
pub mod state;

pub use conflict::satisfies_volume_conflicts;
pub use filter::{
    VolumeRestrictions, NAME, REASON_DISK_CONFLICT, REASON_EXCLUSIVE_CLAIM_CONFLICT,
};
pub use state::{PreFilterState, STATE_KEY};
