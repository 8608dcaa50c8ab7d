//! # ctxflow
//!
//! **ctxflow** makes per-context values transmittable: a value set by the
//! submitting execution stays visible, under the same [`Slot`] identity, to
//! the code that actually runs the task later, possibly on a different,
//! pooled, reused worker, and the worker's own prior state is exactly
//! restored afterward.
//!
//! Plain thread-scoped storage fails at this because pooled workers are not
//! recreated per task: values never flow with the submission and never get
//! cleaned up. ctxflow closes that gap with the Capture–Replay–Restore
//! (CRR) protocol.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐    ┌──────────────┐    ┌──────────────────────┐
//!     │   Slot<T>    │    │   Slot<T>    │    │  foreign thread_local │
//!     │ (biz value)  │    │ (biz value)  │    │ (LocalKeyTransmit)    │
//!     └──────┬───────┘    └──────┬───────┘    └──────────┬───────────┘
//!            ▼                   ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TransmitSet (composite registry of Transmit participants)       │
//! │  - capture(): one opaque Capture, panic-isolated per participant │
//! │  - replay(&Capture) -> Backup / clear() -> Backup                │
//! │  - restore(Backup), hooks fired once per cycle                   │
//! └──────┬──────────────────────┬──────────────────────┬─────────────┘
//!        ▼                      ▼                      ▼
//! ┌──────────────┐      ┌──────────────┐      ┌───────────────────┐
//! │TransmittingTask│    │  ForkScope   │      │TransmittingFuture │
//! │ wrap-time      │    │ one capture, │      │ replay/restore    │
//! │ capture,       │    │ many sibling │      │ around every poll │
//! │ bracketed run  │    │ invocations  │      │                   │
//! └──────────────┘      └──────────────┘      └───────────────────┘
//! ```
//!
//! ### Data flow
//! ```text
//! wrap time (origin)                 execution time (any worker, any delay)
//! ──────────────────                 ────────────────────────────────────
//! set.capture() ──► Capture ──────► backup = set.replay(&capture)
//!                                   ... wrapped body runs ...
//!                                   set.restore(backup)   // finally
//! ```
//!
//! ## Features
//! | Area             | Description                                             | Key types / traits                      |
//! |------------------|---------------------------------------------------------|-----------------------------------------|
//! | **Slots**        | Identity-keyed per-context values with copy policies.   | [`Slot`], [`SlotBuilder`], [`SlotId`]   |
//! | **CRR protocol** | Capture / replay / clear / restore over participants.   | [`TransmitSet`], [`Capture`], [`Backup`]|
//! | **Extension**    | Plug foreign contextual state into the protocol.        | [`Transmit`], [`LocalKeyTransmit`]      |
//! | **Decoration**   | Apply CRR around tasks, forks, and futures.             | [`TransmittingTask`], [`ForkScope`], [`TransmittingFuture`] |
//! | **Workers**      | Context inheritance at worker birth, opt-out per pool.  | [`WorkerBuilder`], [`InheritedSlots`]   |
//! | **Errors**       | Typed usage errors; participant faults stay internal.   | [`TaskError`]                           |
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use ctxflow::{Slot, TaskFn, TransmittingTask, WrapOptions, WorkerBuilder};
//!
//! // A pooled worker: started clean, reused for many submissions.
//! let tenant: Slot<String> = Slot::new();
//! tenant.set("acme".to_string());
//!
//! let seen = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&seen);
//! let probe = tenant.clone();
//! let task = TransmittingTask::wrap(
//!     TaskFn::arc("billing", move || {
//!         *sink.lock().unwrap() = probe.get().as_deref().cloned();
//!         Ok(())
//!     }),
//!     WrapOptions::default(),
//! ).unwrap();
//!
//! // The worker does not inherit ambient state; the capture travels with
//! // the task instead.
//! let worker = WorkerBuilder::new()
//!     .inherit(false)
//!     .spawn(move || task.run())
//!     .unwrap();
//! worker.join().unwrap().unwrap();
//!
//! assert_eq!(seen.lock().unwrap().as_deref(), Some("acme"));
//! ```
//!
//! ## Error handling
//! Only usage errors ([`TaskError::AlreadyWrapped`],
//! [`TaskError::CaptureReleased`]) are user-visible. A participant or hook
//! that panics is caught at the [`TransmitSet`] boundary, logged via the
//! `log` crate with the participant's name, and contributes nothing that
//! cycle. A single misbehaving participant never breaks unrelated tasks
//! sharing the same pool.

mod error;
mod slots;
mod tasks;
mod transmit;
mod workers;

// ---- Public re-exports ----

pub use error::TaskError;
pub use slots::{InheritedSlots, Slot, SlotBuilder, SlotId, snapshot_keys};
pub use tasks::{ForkScope, Task, TaskFn, TaskRef, TransmittingFuture, TransmittingTask, WrapOptions};
pub use transmit::{
    Backup, Capture, Captured, LocalKeyTransmit, ReplayGuard, Restorable, SlotTransmit, Transmit,
    TransmitHook, TransmitSet,
};
pub use workers::WorkerBuilder;
