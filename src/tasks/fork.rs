//! # Forking variant: one capture shared by a whole computation tree.
//!
//! Divide-and-conquer computations fork sub-computations that run on other
//! worker threads but belong to one logical submission. [`ForkScope`] takes
//! the capture once, when the top-level computation is constructed, and
//! every recursive invocation, on whatever worker picked it up, brackets
//! its own body with replay/restore against that same shared snapshot.
//!
//! Siblings never see each other's mutations: each replay installs a copy of
//! the scope's snapshot into the worker's own context, and each restore
//! rolls that worker back.
//!
//! ## Example
//! ```
//! use ctxflow::{ForkScope, Slot, TransmitSet};
//!
//! let set = TransmitSet::new();
//! let depth: Slot<u32> = Slot::new();
//! depth.set(0);
//!
//! let scope = ForkScope::with_set(&set);
//! depth.remove();
//!
//! fn sum(scope: &ForkScope, values: &[u64]) -> u64 {
//!     scope.run(|| match values {
//!         [] => 0,
//!         [v] => *v,
//!         _ => {
//!             let (left, right) = values.split_at(values.len() / 2);
//!             // both halves replay the same snapshot, on any thread
//!             sum(scope, left) + sum(scope, right)
//!         }
//!     })
//! }
//!
//! assert_eq!(sum(&scope, &[1, 2, 3, 4]), 10);
//! ```

use std::sync::Arc;

use crate::error::TaskError;
use crate::transmit::{Capture, TransmitSet};

use super::task::TaskRef;

/// Shared capture for a recursive, forking computation.
///
/// Cloning is cheap and clones address the same snapshot; hand clones to
/// forked sub-computations on other workers.
#[derive(Clone)]
pub struct ForkScope {
    set: Arc<TransmitSet>,
    capture: Capture,
}

impl ForkScope {
    /// Captures the calling context against the process-wide default set.
    #[must_use]
    pub fn new() -> Self {
        Self::with_set(TransmitSet::global())
    }

    /// Captures the calling context against an explicit set.
    #[must_use]
    pub fn with_set(set: &Arc<TransmitSet>) -> Self {
        Self {
            set: Arc::clone(set),
            capture: set.capture(),
        }
    }

    /// The snapshot shared by every invocation in this scope.
    #[must_use]
    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Runs one (sub-)computation body bracketed by replay/restore.
    ///
    /// Restore runs even if the body panics.
    pub fn run<R>(&self, body: impl FnOnce() -> R) -> R {
        let _replayed = self.set.replayed(&self.capture);
        body()
    }

    /// Runs a task inside the scope.
    ///
    /// A task that is itself a transmitting decorator already carries its
    /// own capture and is executed without the ambient bracket, so its
    /// snapshot is applied exactly once.
    pub fn run_task(&self, task: &TaskRef) -> Result<(), TaskError> {
        if task.transmitting().is_some() {
            return task.run();
        }
        self.run(|| task.run())
    }
}

impl Default for ForkScope {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ForkScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForkScope")
            .field("capture", &self.capture)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::task::TaskFn;
    use crate::tasks::transmitting::{TransmittingTask, WrapOptions};
    use crate::{Slot, TransmitSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_siblings_share_snapshot_but_not_mutations() {
        let set = TransmitSet::new();
        let slot: Slot<String> = Slot::new();
        slot.set("base".to_string());
        let scope = ForkScope::with_set(&set);

        let results = Arc::new(Mutex::new(Vec::new()));
        std::thread::scope(|threads| {
            for mutate in [true, false] {
                let scope = scope.clone();
                let slot = slot.clone();
                let results = Arc::clone(&results);
                threads.spawn(move || {
                    scope.run(|| {
                        if mutate {
                            let current = slot.get().unwrap();
                            slot.set(format!("{current}left"));
                        }
                        results
                            .lock()
                            .unwrap()
                            .push(slot.get().as_deref().cloned());
                    });
                });
            }
        });

        let mut seen = results.lock().unwrap().clone();
        seen.sort();
        assert_eq!(
            seen,
            vec![Some("base".to_string()), Some("baseleft".to_string())]
        );
        // parent context is untouched by either child
        assert_eq!(slot.get().as_deref().map(String::as_str), Some("base"));
    }

    #[test]
    fn test_nested_runs_restore_in_lifo_order() {
        let set = TransmitSet::new();
        let slot: Slot<u32> = Slot::new();

        slot.set(1);
        let outer = ForkScope::with_set(&set);
        slot.set(2);
        let inner = ForkScope::with_set(&set);
        slot.set(3);

        outer.run(|| {
            assert_eq!(slot.get().as_deref(), Some(&1));
            inner.run(|| {
                assert_eq!(slot.get().as_deref(), Some(&2));
            });
            assert_eq!(slot.get().as_deref(), Some(&1));
        });
        assert_eq!(slot.get().as_deref(), Some(&3));
    }

    #[test]
    fn test_run_task_skips_bracket_for_decorated_tasks() {
        let set = TransmitSet::new();
        let slot: Slot<u32> = Slot::new();

        slot.set(10);
        let probe = slot.clone();
        let observed = Arc::new(AtomicU32::new(0));
        let sink = Arc::clone(&observed);
        let decorated = TransmittingTask::wrap_with(
            &set,
            TaskFn::arc("own-capture", move || {
                sink.store(probe.get().as_deref().copied().unwrap_or(0), Ordering::SeqCst);
                Ok(())
            }),
            WrapOptions::default(),
        )
        .unwrap();

        // scope captured later, with a different value
        slot.set(20);
        let scope = ForkScope::with_set(&set);

        scope.run_task(&decorated).unwrap();
        // the decorated task saw its own capture, not the scope's
        assert_eq!(observed.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_restore_runs_when_body_panics() {
        let set = TransmitSet::new();
        let slot: Slot<u32> = Slot::new();
        slot.set(1);
        let scope = ForkScope::with_set(&set);
        slot.set(2);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scope.run(|| panic!("fork body failed"));
        }));
        assert!(outcome.is_err());
        assert_eq!(slot.get().as_deref(), Some(&2));
    }
}
