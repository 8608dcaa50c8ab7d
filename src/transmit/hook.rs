//! # Per-cycle callbacks around replay and restore.
//!
//! A [`TransmitHook`] fires once per CRR cycle (not once per participant),
//! before and after the replay that brackets a body and before and after the
//! matching restore. Hooks observe, they do not participate: they contribute
//! no payload, and a panicking hook is caught and logged, never propagated.

/// # Observer callbacks for the CRR cycle.
///
/// All methods default to no-ops; implement the ones you need.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use ctxflow::TransmitHook;
///
/// #[derive(Default)]
/// struct CycleCounter {
///     cycles: AtomicU32,
/// }
///
/// impl TransmitHook for CycleCounter {
///     fn name(&self) -> &str { "cycle-counter" }
///
///     fn before_replay(&self) {
///         self.cycles.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait TransmitHook: Send + Sync + 'static {
    /// Stable hook name, used when logging isolated failures.
    fn name(&self) -> &str {
        "hook"
    }

    /// Fires before any participant replays (also before a `clear`).
    fn before_replay(&self) {}

    /// Fires after every participant replayed.
    fn after_replay(&self) {}

    /// Fires before any participant restores.
    fn before_restore(&self) {}

    /// Fires after every participant restored.
    fn after_restore(&self) {}
}
