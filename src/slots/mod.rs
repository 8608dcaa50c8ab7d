//! # Slots: identity-keyed, per-context value holders.
//!
//! This module provides the storage layer the CRR protocol operates on:
//! - [`Slot`] - a typed handle to a value scoped to the current context
//!   (thread of control), with configurable copy functions
//! - [`SlotBuilder`] - construction-time choices: null handling, copiers,
//!   optional initializer
//! - [`SlotId`] - the stable integer handle identifying a slot
//! - [`InheritedSlots`] - one-shot snapshot moved to a newborn worker
//!   context at creation time (independent from the CRR protocol)
//!
//! ## Storage model
//! ```text
//! Slot<T> (identity: SlotId, copiers, null policy)
//!    │
//!    │ set / get / remove
//!    ▼
//! per-thread ContextMap:  SlotId ──► value (type-erased, Arc-shared)
//!    │
//!    ├─► captured by SlotTransmit (applies on_transmit per slot)
//!    └─► copied to child workers via InheritedSlots (applies on_child)
//! ```
//!
//! A context map is only ever touched by its owning thread; the snapshot
//! handed to a child worker is an owned value moved across, so no map is
//! shared between contexts.

mod context;
mod core;
mod slot;

pub use self::context::{InheritedSlots, snapshot_keys};
pub use self::core::SlotId;
pub use self::slot::{Slot, SlotBuilder};

pub(crate) use self::context::{
    ContextEntry, ContextMap, install_entries, install_map, snapshot_entries, take_map,
};
