//! # Task abstraction and function-backed task implementation.
//!
//! This module defines the [`Task`] trait (synchronous, re-runnable) and a
//! convenient function-backed implementation [`TaskFn`]. The common handle
//! type is [`TaskRef`], an `Arc<dyn Task>` suitable for handing to executors
//! and for decoration by [`TransmittingTask`](crate::TransmittingTask).
//!
//! Tasks introduce no suspension points of their own: `run` executes on the
//! calling thread of control and returns when the body does.

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::transmitting::TransmittingTask;

/// # A synchronous, re-runnable unit of work.
///
/// A `Task` has a stable [`name`](Task::name) and a [`run`](Task::run)
/// method executed by reference, possibly many times, possibly from
/// different threads.
///
/// The [`transmitting`](Task::transmitting) capability query is how the
/// decorator layer detects an already-wrapped task without runtime type
/// inspection: it defaults to `None`, and only
/// [`TransmittingTask`](crate::TransmittingTask) answers `Some`.
///
/// # Example
/// ```
/// use ctxflow::{Task, TaskError};
///
/// struct Demo;
///
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     fn run(&self) -> Result<(), TaskError> {
///         // do work...
///         Ok(())
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task on the calling thread.
    fn run(&self) -> Result<(), TaskError>;

    /// Capability query answered only by the transmitting decorator.
    fn transmitting(&self) -> Option<&TransmittingTask> {
        None
    }
}

/// Shared reference to a task.
pub type TaskRef = Arc<dyn Task>;

/// Function-backed task implementation.
///
/// Wraps a closure executed by reference on every run; shared state, if
/// needed, goes through an explicit `Arc` inside the closure.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the task and returns it as a shared handle (`Arc<dyn Task>`).
    ///
    /// ## Example
    /// ```
    /// use ctxflow::{TaskFn, TaskRef};
    ///
    /// let t: TaskRef = TaskFn::arc("hello", || Ok(()));
    /// assert_eq!(t.name(), "hello");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Task for TaskFn<F>
where
    F: Fn() -> Result<(), TaskError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self) -> Result<(), TaskError> {
        (self.f)()
    }
}
