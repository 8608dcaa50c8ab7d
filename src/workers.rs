//! # Worker creation with explicit context inheritance.
//!
//! The core cannot hook native thread construction, so child-context
//! inheritance is modeled as a protocol obligation of whoever creates
//! workers: take an [`InheritedSlots`] snapshot on the parent, move it into
//! the child, adopt it there exactly once, or skip it deliberately.
//!
//! [`WorkerBuilder`] discharges that obligation over `std::thread::Builder`.
//! Inheritance is on by default (ad-hoc helper threads usually want the
//! parent's ambient values) and disabled per factory with
//! [`inherit(false)`](WorkerBuilder::inherit), the right setting for pool
//! workers, which must start clean and receive state only through
//! task-attached captures.
//!
//! ## Example
//! ```
//! use ctxflow::{Slot, WorkerBuilder};
//!
//! let user: Slot<String> = Slot::new();
//! user.set("alice".to_string());
//!
//! let probe = user.clone();
//! let handle = WorkerBuilder::new()
//!     .name("helper")
//!     .spawn(move || probe.get().as_deref().cloned())
//!     .unwrap();
//! assert_eq!(handle.join().unwrap(), Some("alice".to_string()));
//! ```

use std::io;
use std::thread::{self, JoinHandle};

use crate::slots::InheritedSlots;

/// Thread factory performing slot inheritance once at worker birth.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    name: Option<String>,
    stack_size: Option<usize>,
    skip_inherit: bool,
}

impl WorkerBuilder {
    /// Creates a factory with inheritance enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the spawned thread.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the spawned thread's stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Controls whether the worker inherits the parent's slots at birth.
    ///
    /// Pool workers should pass `false`: a reused worker must not carry
    /// ambient values; only task-attached captures apply there.
    #[must_use]
    pub fn inherit(mut self, yes: bool) -> Self {
        self.skip_inherit = !yes;
        self
    }

    /// Spawns the worker.
    ///
    /// The inheritance snapshot is taken on the calling thread at spawn
    /// time and adopted as the first thing the worker does.
    pub fn spawn<F, T>(self, f: F) -> io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inherited = if self.skip_inherit {
            None
        } else {
            Some(InheritedSlots::from_current())
        };

        let mut builder = thread::Builder::new();
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder.spawn(move || {
            if let Some(snapshot) = inherited {
                snapshot.adopt();
            }
            f()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slot;

    #[test]
    fn test_inheriting_worker_sees_parent_slots() {
        let slot: Slot<u32> = Slot::new();
        slot.set(77);

        let probe = slot.clone();
        let handle = WorkerBuilder::new()
            .spawn(move || probe.get().as_deref().copied())
            .unwrap();
        assert_eq!(handle.join().unwrap(), Some(77));
    }

    #[test]
    fn test_pool_worker_starts_clean() {
        let slot: Slot<u32> = Slot::new();
        slot.set(77);

        let probe = slot.clone();
        let handle = WorkerBuilder::new()
            .inherit(false)
            .spawn(move || probe.get().as_deref().copied())
            .unwrap();
        assert_eq!(handle.join().unwrap(), None);
    }

    #[test]
    fn test_worker_mutations_do_not_reach_parent() {
        let slot: Slot<u32> = Slot::new();
        slot.set(1);

        let probe = slot.clone();
        WorkerBuilder::new()
            .spawn(move || probe.set(2))
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(slot.get().as_deref(), Some(&1));
    }
}
