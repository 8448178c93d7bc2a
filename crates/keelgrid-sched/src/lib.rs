//! keelgrid-sched — scheduler framework seams for filter plugins.
//!
//! The placement engine evaluates one pod against many candidate nodes per
//! scheduling attempt. This crate defines the surfaces plugins implement
//! and consume during that attempt:
//!
//! - **`cycle_state`** — per-attempt keyed scratch store, written once at
//!   pre-filter and read by every per-node evaluation
//! - **`plugin`** — extension-point traits, filter verdicts, and the
//!   pre-filter skip short-circuit
//! - **`events`** — cluster change events and the queueing hints that
//!   decide when a rejected pod is worth retrying
//! - **`error`** — the scheduling error type shared by extension points

pub mod cycle_state;
pub mod error;
pub mod events;
pub mod plugin;

pub use cycle_state::{CycleState, StateData};
pub use error::{SchedError, SchedResult};
pub use events::{ClusterEvent, ClusterEventKind, EventInterest, QueueingHint};
pub use plugin::{EnqueuePlugin, FilterPlugin, Plugin, PreFilterPlugin, PreFilterResult, Verdict};
