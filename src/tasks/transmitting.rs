//! # The transmitting decorator.
//!
//! [`TransmittingTask`] wraps one unit of work so that the submitting
//! context's state travels with it: the capture is taken at wrap time, on
//! the origin context, and every run brackets the body with replay/restore
//! on whatever worker executes it.
//!
//! ## What it guarantees
//! - The capture is taken exactly once, at [`wrap`](TransmittingTask::wrap)
//!   time.
//! - Every run is bracketed: replay before the body, restore after it,
//!   restore running even when the body fails or panics.
//! - Wrapping an already-wrapped task never double-wraps: with
//!   [`WrapOptions::idempotent`] the existing decorator is returned
//!   unchanged, otherwise the call fails with
//!   [`TaskError::AlreadyWrapped`].
//! - With [`WrapOptions::release_after_run`], exactly one run consumes the
//!   capture; every other run (including a concurrent racer) fails with
//!   [`TaskError::CaptureReleased`] without invoking the body.
//!
//! ## Example
//! ```
//! use std::sync::Arc;
//! use ctxflow::{Slot, TaskFn, TransmitSet, TransmittingTask, WrapOptions};
//!
//! let set = TransmitSet::new();
//! let request_id: Slot<u64> = Slot::new();
//! request_id.set(7);
//!
//! let seen = Arc::new(std::sync::Mutex::new(None));
//! let sink = Arc::clone(&seen);
//! let slot = request_id.clone();
//! let task = TransmittingTask::wrap_with(
//!     &set,
//!     TaskFn::arc("handler", move || {
//!         *sink.lock().unwrap() = slot.get().map(|id| *id);
//!         Ok(())
//!     }),
//!     WrapOptions::default(),
//! ).unwrap();
//!
//! request_id.remove(); // origin moves on; the capture already holds 7
//! task.run().unwrap();
//! assert_eq!(*seen.lock().unwrap(), Some(7));
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::TaskError;
use crate::transmit::{Capture, TransmitSet};

use super::task::{Task, TaskRef};

/// Decoration flags, fixed at construction.
#[derive(Clone, Copy, Debug, Default)]
pub struct WrapOptions {
    /// Consume the capture on the first successful run; later runs fail
    /// with [`TaskError::CaptureReleased`].
    pub release_after_run: bool,
    /// Wrapping an already-wrapped task returns it unchanged instead of
    /// failing with [`TaskError::AlreadyWrapped`].
    pub idempotent: bool,
}

/// Decorator applying capture–replay–restore around one task's execution.
pub struct TransmittingTask {
    inner: TaskRef,
    set: Arc<TransmitSet>,
    /// Single-owner cell; `release_after_run` takes the capture out
    /// atomically so a racing second run observes the empty cell.
    cell: Mutex<Option<Capture>>,
    release_after_run: bool,
}

impl TransmittingTask {
    /// Wraps a task against the process-wide default set, capturing the
    /// calling context immediately.
    pub fn wrap(task: TaskRef, options: WrapOptions) -> Result<TaskRef, TaskError> {
        Self::wrap_with(TransmitSet::global(), task, options)
    }

    /// Wraps a task against an explicit set.
    pub fn wrap_with(
        set: &Arc<TransmitSet>,
        task: TaskRef,
        options: WrapOptions,
    ) -> Result<TaskRef, TaskError> {
        if task.transmitting().is_some() {
            return if options.idempotent {
                Ok(task)
            } else {
                Err(TaskError::AlreadyWrapped)
            };
        }
        let capture = set.capture();
        Ok(Arc::new(Self {
            inner: task,
            set: Arc::clone(set),
            cell: Mutex::new(Some(capture)),
            release_after_run: options.release_after_run,
        }))
    }

    /// Pure projection back to the original task.
    ///
    /// Returns the identical inner reference for a decorated task, and the
    /// input unchanged otherwise.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use ctxflow::{TaskFn, TaskRef, TransmittingTask, WrapOptions};
    ///
    /// let original: TaskRef = TaskFn::arc("t", || Ok(()));
    /// let wrapped = TransmittingTask::wrap(Arc::clone(&original), WrapOptions::default()).unwrap();
    /// assert!(Arc::ptr_eq(&TransmittingTask::unwrap(wrapped), &original));
    /// ```
    #[must_use]
    pub fn unwrap(task: TaskRef) -> TaskRef {
        match task.transmitting() {
            Some(decorator) => Arc::clone(&decorator.inner),
            None => task,
        }
    }

    /// The wrapped task.
    #[must_use]
    pub fn inner(&self) -> &TaskRef {
        &self.inner
    }

    /// True once a `release_after_run` decorator has consumed its capture.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.cell
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn checkout(&self) -> Result<Capture, TaskError> {
        let mut cell = self.cell.lock().unwrap_or_else(PoisonError::into_inner);
        if self.release_after_run {
            cell.take().ok_or(TaskError::CaptureReleased)
        } else {
            cell.clone().ok_or(TaskError::CaptureReleased)
        }
    }
}

impl Task for TransmittingTask {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn run(&self) -> Result<(), TaskError> {
        let capture = self.checkout()?;
        let _replayed = self.set.replayed(&capture);
        self.inner.run()
    }

    fn transmitting(&self) -> Option<&TransmittingTask> {
        Some(self)
    }
}

impl std::fmt::Debug for TransmittingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransmittingTask")
            .field("task", &self.inner.name())
            .field("release_after_run", &self.release_after_run)
            .field("released", &self.is_released())
            .finish()
    }
}
