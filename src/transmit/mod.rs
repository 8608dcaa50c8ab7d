//! # Transmit: the Capture–Replay–Restore (CRR) protocol.
//!
//! This module implements the transmission protocol once, generically, over
//! an open set of participants:
//! - [`Transmit`] - the participant contract: capture / replay / clear /
//!   restore over some kind of contextual state
//! - [`SlotTransmit`] - the built-in, primary participant backed by the
//!   per-context slot map
//! - [`LocalKeyTransmit`] - adapter for foreign `thread_local!` values that
//!   cannot be migrated to slots
//! - [`TransmitSet`] - the composite: aggregates every participant's payload
//!   into one opaque [`Capture`] / [`Backup`], isolating per-participant
//!   failures
//! - [`TransmitHook`] - optional callbacks fired once per CRR cycle
//!
//! ## Protocol flow
//! ```text
//!  origin context                         destination context (worker)
//!  ──────────────                         ────────────────────────────
//!  set.capture() ──► Capture ── (any delay, any thread) ──┐
//!                                                         ▼
//!                                 backup = set.replay(&capture)
//!                                 ... run the body ...
//!                                 set.restore(backup)   // always, even on panic
//! ```
//!
//! Participants never see each other: a panic in one is caught at the
//! composite boundary, logged with the participant's name, and the cycle
//! continues with the survivors.

mod adapter;
mod hook;
mod set;
mod slots;
#[allow(clippy::module_inception)]
mod transmit;

pub use adapter::LocalKeyTransmit;
pub use hook::TransmitHook;
pub use set::{Backup, Capture, ReplayGuard, TransmitSet};
pub use slots::SlotTransmit;
pub use transmit::{Captured, Restorable, Transmit};
