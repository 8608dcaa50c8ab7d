//! Erased slot internals shared by the typed [`Slot`](crate::Slot) API,
//! the per-thread context map, and the built-in slot participant.
//!
//! A slot's identity is a [`SlotId`] drawn from a process-wide atomic
//! allocator. Handles are never reused; the erased core is freed when the
//! last holder (the user's `Slot<T>` clones plus any context entries still
//! carrying a value) drops it.

use std::any::Any;
use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable integer handle identifying a slot.
///
/// Two `Slot` handles compare equal exactly when they were cloned from the
/// same original slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub(crate) u64);

static NEXT_SLOT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_slot_id() -> SlotId {
    SlotId(NEXT_SLOT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Type-erased value stored per context.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

/// Type-erased copy function applied to a stored value.
pub(crate) type Copier = Arc<dyn Fn(&ErasedValue) -> ErasedValue + Send + Sync>;

/// The shadow copy: pass the shared reference through unchanged.
pub(crate) fn shadow_copier() -> Copier {
    Arc::new(Arc::clone)
}

/// Erased core of a slot: identity, null policy, and copy functions.
pub(crate) struct SlotCore {
    pub(crate) id: SlotId,
    pub(crate) label: Cow<'static, str>,
    /// When set, storing an absent value is equivalent to removal and the
    /// slot never holds an explicit null.
    pub(crate) ignore_null: bool,
    /// Applied once per slot when a child context is created.
    pub(crate) on_child: Copier,
    /// Applied on every capture.
    pub(crate) on_transmit: Copier,
    /// Optional initializer; makes `get` register the slot on first access.
    pub(crate) initial: Option<Arc<dyn Fn() -> ErasedValue + Send + Sync>>,
}

impl std::fmt::Debug for SlotCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotCore")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("ignore_null", &self.ignore_null)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_monotonic() {
        let a = next_slot_id();
        let b = next_slot_id();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_shadow_copier_preserves_identity() {
        let value: ErasedValue = Arc::new(42u32);
        let copied = (shadow_copier())(&value);
        assert!(Arc::ptr_eq(&value, &copied));
    }
}
