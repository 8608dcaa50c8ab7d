//! Per-thread context map and child-context inheritance.
//!
//! Every thread of control owns one `ContextMap`, the set of slots that
//! currently hold a value in that context. The map is reached only through
//! the owning thread's `thread_local!`, so lookups and updates never race.
//!
//! Two independent mechanisms move state between contexts:
//! - [`InheritedSlots`]: a one-shot snapshot taken on the parent and moved
//!   into a newborn worker, applying each slot's `on_child` copier exactly
//!   once at context birth (see [`WorkerBuilder`](crate::WorkerBuilder));
//! - the CRR protocol, which captures and replays through
//!   [`TransmitSet`](crate::TransmitSet) and does not involve this module's
//!   inheritance path at all.

use std::cell::RefCell;
use std::collections::HashMap;

use std::sync::Arc;

use super::core::{ErasedValue, SlotCore, SlotId};

thread_local! {
    static CONTEXT: RefCell<ContextMap> = RefCell::new(ContextMap::default());
}

/// One live slot entry in a context map.
///
/// A `None` value is an explicitly stored null, representable only for
/// slots that keep nulls (`ignore_null` off).
#[derive(Clone)]
pub(crate) struct ContextEntry {
    pub(crate) core: Arc<SlotCore>,
    pub(crate) value: Option<ErasedValue>,
}

/// The set of slots holding a value in the current context.
#[derive(Default)]
pub(crate) struct ContextMap {
    pub(crate) entries: HashMap<SlotId, ContextEntry>,
}

impl ContextMap {
    pub(crate) fn from_entries(entries: Vec<ContextEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.core.id, e)).collect(),
        }
    }
}

/// Runs `f` with mutable access to the current thread's context map.
///
/// Callers must not run user code (copiers, initializers) inside `f`:
/// user code may itself touch slots, and the map is behind a `RefCell`.
pub(crate) fn with_map<R>(f: impl FnOnce(&mut ContextMap) -> R) -> R {
    CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
}

/// Clones the current context's entries (shared values, cheap).
pub(crate) fn snapshot_entries() -> Vec<ContextEntry> {
    with_map(|map| map.entries.values().cloned().collect())
}

/// Takes the whole current map out, leaving an empty one behind.
pub(crate) fn take_map() -> ContextMap {
    with_map(std::mem::take)
}

/// Replaces the current map wholesale.
pub(crate) fn install_map(map: ContextMap) {
    with_map(|current| *current = map);
}

/// Replaces the current map with exactly the given entries.
pub(crate) fn install_entries(entries: Vec<ContextEntry>) {
    install_map(ContextMap::from_entries(entries));
}

/// Returns the ids of every slot currently holding a value in this context.
///
/// The result is a point-in-time copy, not a live view.
///
/// # Example
/// ```
/// use ctxflow::{Slot, snapshot_keys};
///
/// let slot: Slot<String> = Slot::new();
/// slot.set("hello".to_string());
/// assert!(snapshot_keys().contains(&slot.id()));
/// ```
pub fn snapshot_keys() -> Vec<SlotId> {
    with_map(|map| map.entries.keys().copied().collect())
}

/// # One-shot slot snapshot for a newborn worker context.
///
/// Taken on the parent with [`InheritedSlots::from_current`], moved into the
/// child, and installed there with [`InheritedSlots::adopt`]. The key set is
/// copied (not a live view) and each slot's `on_child` copier is applied
/// once, so later mutation of either context is independent.
///
/// Worker-creation machinery is expected to perform this exactly once per
/// worker, and to offer a way to skip it entirely: pooled workers should not
/// inherit ambient values, only task-attached captures should apply. See
/// [`WorkerBuilder::inherit`](crate::WorkerBuilder::inherit).
pub struct InheritedSlots {
    entries: Vec<ContextEntry>,
}

impl InheritedSlots {
    /// Snapshots the calling context's slots, applying each slot's
    /// `on_child` copier.
    #[must_use]
    pub fn from_current() -> Self {
        let raw = snapshot_entries();
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            let value = entry.value.as_ref().map(|v| (entry.core.on_child)(v));
            entries.push(ContextEntry {
                core: entry.core,
                value,
            });
        }
        Self { entries }
    }

    /// Installs the snapshot as the calling thread's context map.
    ///
    /// Intended to run once, as the first thing a newborn worker does.
    /// Whatever map the thread had before is discarded.
    pub fn adopt(self) {
        install_entries(self.entries);
    }

    /// Number of slots carried by this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the parent context had no live slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slot;

    #[test]
    fn test_snapshot_keys_reflects_set_and_remove() {
        let slot: Slot<u32> = Slot::new();
        assert!(!snapshot_keys().contains(&slot.id()));

        slot.set(7);
        assert!(snapshot_keys().contains(&slot.id()));

        slot.remove();
        assert!(!snapshot_keys().contains(&slot.id()));
    }

    #[test]
    fn test_inherited_snapshot_is_independent_of_parent() {
        let slot: Slot<String> = Slot::new();
        slot.set("parent".to_string());

        let inherited = InheritedSlots::from_current();
        assert_eq!(inherited.len(), 1);

        // Parent keeps mutating after the snapshot was taken.
        slot.set("parent-after".to_string());

        std::thread::spawn(move || {
            inherited.adopt();
            assert_eq!(slot.get().as_deref().map(String::as_str), Some("parent"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_on_child_copier_applied_once_at_birth() {
        let slot: Slot<u32> = Slot::builder().on_child_context(|v| v + 1).build();
        slot.set(10);

        let inherited = InheritedSlots::from_current();
        std::thread::spawn(move || {
            inherited.adopt();
            assert_eq!(slot.get().as_deref(), Some(&11));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_child_without_adoption_sees_nothing() {
        let slot: Slot<u32> = Slot::new();
        slot.set(5);

        std::thread::spawn(move || {
            assert_eq!(slot.get(), None);
        })
        .join()
        .unwrap();
    }
}
