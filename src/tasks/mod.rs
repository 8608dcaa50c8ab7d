//! # Task abstractions and the transmitting decorators.
//!
//! This module provides the unit-of-work types and the decoration
//! discipline that applies CRR around their execution:
//! - [`Task`] - trait for synchronous, re-runnable units of work
//! - [`TaskFn`] - function-backed task implementation
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TransmittingTask`] - the decorator: capture at wrap time,
//!   replay/restore around every run
//! - [`WrapOptions`] - `release_after_run` and `idempotent` flags
//! - [`ForkScope`] - recursive/forking variant sharing one capture across
//!   sibling computations
//! - [`TransmittingFuture`] - future wrapper bracketing every poll
//!
//! ## Decoration flow
//! ```text
//! origin context            TransmittingTask              worker context
//! ──────────────            ────────────────              ──────────────
//! wrap(task) ── capture ──► [ Capture cell ]
//!                                 │      (submitted, queued, moved...)
//!                                 ▼
//!                           run(): checkout ──► replay ──► body ──► restore
//! ```

mod fork;
mod future;
mod task;
mod transmitting;

pub use fork::ForkScope;
pub use future::TransmittingFuture;
pub use task::{Task, TaskFn, TaskRef};
pub use transmitting::{TransmittingTask, WrapOptions};
