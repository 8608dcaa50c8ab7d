//! # Typed slot handle and its builder.
//!
//! [`Slot<T>`] is an identity-keyed holder of a value for the current
//! context. Clones of one slot share the same identity; `Slot::new()` always
//! mints a fresh one. Values are stored behind `Arc<T>`, so the default copy
//! policy on both inheritance and capture is the *shadow copy*: the shared
//! reference is passed through unchanged.
//!
//! ## Construction-time choices
//! The null policy and both copiers are explicit, per-slot choices made at
//! construction ([`SlotBuilder`]); there is no hidden global default beyond
//! the documented ones:
//! - `ignore_null`: **on** by default, so storing an absent value is removal,
//!   and an absent slot is excluded from capture;
//! - `on_child_context`: applied once when a child context is born;
//! - `on_transmit`: applied on every capture;
//! - `initial`: optional initializer, makes `get` register the slot.
//!
//! ## Example
//! ```
//! use ctxflow::Slot;
//!
//! let trace_id: Slot<String> = Slot::builder()
//!     .label("trace-id")
//!     .on_transmit(|id: &String| id.clone())
//!     .build();
//!
//! trace_id.set("req-42".to_string());
//! assert_eq!(trace_id.get().as_deref().map(String::as_str), Some("req-42"));
//!
//! trace_id.remove();
//! assert_eq!(trace_id.get(), None);
//! ```

use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use super::context::{ContextEntry, with_map};
use super::core::{Copier, ErasedValue, SlotCore, SlotId, next_slot_id, shadow_copier};

/// Identity-keyed, per-context value holder.
///
/// Cheap to clone; all clones address the same per-context value.
pub struct Slot<T: Send + Sync + 'static> {
    core: Arc<SlotCore>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: Send + Sync + 'static> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            _marker: PhantomData,
        }
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("id", &self.core.id)
            .field("label", &self.core.label)
            .finish()
    }
}

impl<T: Send + Sync + 'static> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> Slot<T> {
    /// Creates a slot with the default policy: ignore-null on, shadow copy
    /// for both inheritance and transmission, no initializer.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a slot with explicit construction-time choices.
    #[must_use]
    pub fn builder() -> SlotBuilder<T> {
        SlotBuilder::new()
    }

    /// The slot's stable identity.
    #[must_use]
    pub fn id(&self) -> SlotId {
        self.core.id
    }

    /// The label used when this slot appears in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.core.label
    }

    /// Returns the value held in the current context, if any.
    ///
    /// When the slot was built with an initializer and holds no value yet,
    /// the initializer runs and its result is registered in the context.
    /// The return reflects the context after registration, so an
    /// initializer that stores into its own slot takes precedence over
    /// the value it returns.
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        enum Lookup {
            Hit(Option<ErasedValue>),
            Absent,
        }
        let found = with_map(|map| match map.entries.get(&self.core.id) {
            Some(entry) => Lookup::Hit(entry.value.clone()),
            None => Lookup::Absent,
        });
        match found {
            Lookup::Hit(value) => value.and_then(Self::downcast),
            Lookup::Absent => {
                // Initializer is user code: run it outside the map borrow.
                let init = self.core.initial.as_ref()?;
                let value = init();
                let entry = ContextEntry {
                    core: Arc::clone(&self.core),
                    value: Some(value),
                };
                // The initializer may have stored into this slot itself;
                // return what the map actually holds after the insert
                // attempt, not the computed value.
                let stored = with_map(|map| {
                    map.entries
                        .entry(self.core.id)
                        .or_insert(entry)
                        .value
                        .clone()
                });
                stored.and_then(Self::downcast)
            }
        }
    }

    /// Stores a value in the current context, registering the slot.
    pub fn set(&self, value: T) {
        self.set_shared(Arc::new(value));
    }

    /// Stores an already-shared value in the current context.
    pub fn set_shared(&self, value: Arc<T>) {
        self.insert(Some(value as ErasedValue));
    }

    /// Stores an optional value.
    ///
    /// `set_opt(None)` is equivalent to [`remove`](Slot::remove) when the
    /// slot ignores nulls (the default). Otherwise the slot registers as
    /// "present but empty": it participates in capture and replay, and
    /// [`get`](Slot::get) returns `None` while [`is_set`](Slot::is_set)
    /// returns `true`.
    pub fn set_opt(&self, value: Option<T>) {
        match value {
            Some(v) => self.set(v),
            None if self.core.ignore_null => self.remove(),
            None => self.insert(None),
        }
    }

    /// Removes the value from the current context, unregistering the slot.
    pub fn remove(&self) {
        with_map(|map| {
            map.entries.remove(&self.core.id);
        });
    }

    /// True if the slot is registered in the current context (including an
    /// explicitly stored null).
    #[must_use]
    pub fn is_set(&self) -> bool {
        with_map(|map| map.entries.contains_key(&self.core.id))
    }

    fn insert(&self, value: Option<ErasedValue>) {
        let entry = ContextEntry {
            core: Arc::clone(&self.core),
            value,
        };
        with_map(|map| {
            map.entries.insert(self.core.id, entry);
        });
    }

    fn downcast(value: ErasedValue) -> Option<Arc<T>> {
        value.downcast::<T>().ok()
    }
}

/// Builder exposing each slot policy as an explicit construction-time choice.
pub struct SlotBuilder<T: Send + Sync + 'static> {
    label: Option<Cow<'static, str>>,
    ignore_null: bool,
    on_child: Copier,
    on_transmit: Copier,
    initial: Option<Arc<dyn Fn() -> ErasedValue + Send + Sync>>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: Send + Sync + 'static> SlotBuilder<T> {
    fn new() -> Self {
        Self {
            label: None,
            ignore_null: true,
            on_child: shadow_copier(),
            on_transmit: shadow_copier(),
            initial: None,
            _marker: PhantomData,
        }
    }

    /// Label used for this slot in logs. Defaults to `slot-{id}`.
    #[must_use]
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether an absent value stored via [`Slot::set_opt`] means removal
    /// (default `true`).
    #[must_use]
    pub fn ignore_null(mut self, yes: bool) -> Self {
        self.ignore_null = yes;
        self
    }

    /// Copy function applied once per slot when a child context is created.
    /// Defaults to the shadow copy (the shared reference passes through).
    #[must_use]
    pub fn on_child_context(mut self, f: impl Fn(&T) -> T + Send + Sync + 'static) -> Self {
        self.on_child = erase_copier(f);
        self
    }

    /// Copy function applied on every capture. Defaults to the shadow copy.
    #[must_use]
    pub fn on_transmit(mut self, f: impl Fn(&T) -> T + Send + Sync + 'static) -> Self {
        self.on_transmit = erase_copier(f);
        self
    }

    /// Initializer computed on first [`Slot::get`] in a context that holds
    /// no value; the computed value is registered as a side effect.
    #[must_use]
    pub fn initial(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.initial = Some(Arc::new(move || Arc::new(f()) as ErasedValue));
        self
    }

    /// Mints the slot with a fresh identity.
    #[must_use]
    pub fn build(self) -> Slot<T> {
        let id = next_slot_id();
        let label = self
            .label
            .unwrap_or_else(|| Cow::Owned(format!("slot-{}", id.0)));
        Slot {
            core: Arc::new(SlotCore {
                id,
                label,
                ignore_null: self.ignore_null,
                on_child: self.on_child,
                on_transmit: self.on_transmit,
                initial: self.initial,
            }),
            _marker: PhantomData,
        }
    }
}

fn erase_copier<T: Send + Sync + 'static>(f: impl Fn(&T) -> T + Send + Sync + 'static) -> Copier {
    Arc::new(move |value: &ErasedValue| match value.clone().downcast::<T>() {
        Ok(typed) => Arc::new(f(&typed)) as ErasedValue,
        Err(original) => original,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot_keys;

    #[test]
    fn test_set_get_remove() {
        let slot: Slot<u32> = Slot::new();
        assert_eq!(slot.get(), None);

        slot.set(1);
        assert_eq!(slot.get().as_deref(), Some(&1));

        slot.set(2);
        assert_eq!(slot.get().as_deref(), Some(&2));

        slot.remove();
        assert_eq!(slot.get(), None);
        assert!(!slot.is_set());
    }

    #[test]
    fn test_clones_share_identity_fresh_slots_do_not() {
        let a: Slot<u32> = Slot::new();
        let b = a.clone();
        let c: Slot<u32> = Slot::new();

        a.set(9);
        assert_eq!(b.get().as_deref(), Some(&9));
        assert_eq!(c.get(), None);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_set_opt_none_is_remove_under_ignore_null() {
        let slot: Slot<String> = Slot::new();
        slot.set("x".to_string());

        slot.set_opt(None);
        assert!(!slot.is_set());
        assert!(!snapshot_keys().contains(&slot.id()));
    }

    #[test]
    fn test_explicit_null_registers_when_nulls_are_kept() {
        let slot: Slot<String> = Slot::builder().ignore_null(false).build();
        slot.set_opt(None);

        assert!(slot.is_set());
        assert_eq!(slot.get(), None);
        assert!(snapshot_keys().contains(&slot.id()));
    }

    #[test]
    fn test_initializer_registers_on_get() {
        let slot: Slot<u32> = Slot::builder().initial(|| 41).build();
        assert!(!slot.is_set());

        assert_eq!(slot.get().as_deref(), Some(&41));
        assert!(slot.is_set());

        slot.set(42);
        assert_eq!(slot.get().as_deref(), Some(&42));
    }

    #[test]
    fn test_initializer_writing_its_own_slot_wins() {
        use std::sync::OnceLock;

        let handle: Arc<OnceLock<Slot<u32>>> = Arc::new(OnceLock::new());
        let inner = Arc::clone(&handle);
        let slot: Slot<u32> = Slot::builder()
            .initial(move || {
                if let Some(me) = inner.get() {
                    me.set(7);
                }
                1
            })
            .build();
        let _ = handle.set(slot.clone());

        // get must return the stored state, not the computed 1
        assert_eq!(slot.get().as_deref(), Some(&7));
        assert_eq!(slot.get().as_deref(), Some(&7));
    }

    #[test]
    fn test_shared_value_shadow_copy() {
        let slot: Slot<Vec<u8>> = Slot::new();
        let shared = Arc::new(vec![1, 2, 3]);
        slot.set_shared(Arc::clone(&shared));
        assert!(Arc::ptr_eq(&shared, &slot.get().unwrap()));
    }
}
