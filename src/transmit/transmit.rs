//! # The participant contract of the CRR protocol.
//!
//! A [`Transmit`] is a stateless protocol object: it owns no data of its
//! own, it only knows how to snapshot, install, and roll back *some* kind of
//! contextual state living in the current thread of control. Participants
//! may be registered and unregistered dynamically on a
//! [`TransmitSet`](crate::TransmitSet); the built-in slot-backed participant
//! and any number of adapters coexist in the same set.

use std::any::Any;
use std::sync::Arc;

/// Opaque captured payload: immutable, shareable, replayable many times.
pub type Captured = Arc<dyn Any + Send + Sync>;

/// Opaque backup payload: owned, consumed exactly once by `restore`.
pub type Restorable = Box<dyn Any + Send>;

/// # A pluggable participant in the Capture–Replay–Restore protocol.
///
/// Implementations must uphold one invariant: `restore(backup)` leaves the
/// participant's state exactly as it was immediately before the
/// `replay`/`clear` call that produced `backup`, no matter what happened in
/// between.
///
/// All four operations run synchronously on the calling thread of control;
/// they must not block and must not assume any particular thread beyond
/// "replay, the body, and restore happen on the same one".
///
/// # Example
/// ```
/// use std::any::Any;
/// use std::cell::Cell;
/// use std::sync::Arc;
/// use ctxflow::{Captured, Restorable, Transmit};
///
/// thread_local! {
///     static DEPTH: Cell<u32> = const { Cell::new(0) };
/// }
///
/// struct DepthTransmit;
///
/// impl Transmit for DepthTransmit {
///     fn name(&self) -> &str { "depth" }
///
///     fn capture(&self) -> Captured {
///         Arc::new(DEPTH.get())
///     }
///
///     fn replay(&self, captured: &Captured) -> Restorable {
///         let prior = DEPTH.get();
///         if let Some(depth) = captured.downcast_ref::<u32>() {
///             DEPTH.set(*depth);
///         }
///         Box::new(prior)
///     }
///
///     fn clear(&self) -> Restorable {
///         let prior = DEPTH.get();
///         DEPTH.set(0);
///         Box::new(prior)
///     }
///
///     fn restore(&self, backup: Restorable) {
///         if let Ok(prior) = backup.downcast::<u32>() {
///             DEPTH.set(*prior);
///         }
///     }
/// }
/// ```
pub trait Transmit: Send + Sync + 'static {
    /// Stable participant name, used when logging isolated failures.
    fn name(&self) -> &str {
        "transmit"
    }

    /// Snapshots this participant's state in the calling context.
    fn capture(&self) -> Captured;

    /// Installs a captured snapshot, returning a backup of the state it
    /// displaced.
    fn replay(&self, captured: &Captured) -> Restorable;

    /// Empties this participant's state, returning a backup of what was
    /// there. Equivalent to replaying an empty capture.
    fn clear(&self) -> Restorable;

    /// Rolls the participant back to a previously returned backup.
    fn restore(&self, backup: Restorable);
}
