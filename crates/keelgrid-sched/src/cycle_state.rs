//! Per-attempt keyed state shared across filter evaluations.
//!
//! A scheduling attempt computes plugin state once at pre-filter, fans out
//! per-node filter evaluations that read it concurrently, and only mutates
//! it again during the strictly-later preemption simulation phase. The
//! borrow rules enforce that protocol directly: reads take `&CycleState`,
//! simulation updates take `&mut CycleState`, no locking involved.

use std::any::Any;
use std::collections::HashMap;

/// A value stored in a [`CycleState`] slot.
///
/// Blanket-implemented for any cloneable `'static` type. Cloning is by
/// value, so a branched cycle state never aliases mutable data with its
/// parent; slot types that want cheap clones share their immutable parts
/// internally (e.g. behind an `Arc`).
pub trait StateData: Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn StateData>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> StateData for T
where
    T: Any + Send + Sync + Clone,
{
    fn clone_box(&self) -> Box<dyn StateData> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Keyed scratch space for one scheduling attempt.
///
/// Slots are keyed by a plugin-unique static string and discarded with the
/// attempt. Cloning produces an independent branch for speculative
/// evaluation.
#[derive(Default)]
pub struct CycleState {
    slots: HashMap<&'static str, Box<dyn StateData>>,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value.
    pub fn write<T: StateData>(&mut self, key: &'static str, value: T) {
        self.slots.insert(key, Box::new(value));
    }

    /// Typed read of the slot at `key`. Returns `None` if the slot is
    /// absent or holds a different type.
    pub fn read<T: StateData>(&self, key: &str) -> Option<&T> {
        (**self.slots.get(key)?).as_any().downcast_ref()
    }

    /// Typed mutable read of the slot at `key`.
    pub fn read_mut<T: StateData>(&mut self, key: &str) -> Option<&mut T> {
        self.slots.get_mut(key)?.as_any_mut().downcast_mut()
    }

    /// Drop the slot at `key`, if present.
    pub fn remove(&mut self, key: &str) {
        self.slots.remove(key);
    }
}

impl Clone for CycleState {
    fn clone(&self) -> Self {
        Self {
            slots: self
                .slots
                .iter()
                .map(|(k, v)| (*k, (**v).clone_box()))
                .collect(),
        }
    }
}
