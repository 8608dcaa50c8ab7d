//! # TransmitSet: the composite orchestrating every registered participant.
//!
//! [`TransmitSet`] runs the CRR protocol once, generically, over an open,
//! ordered set of [`Transmit`] participants, and aggregates their payloads
//! into one opaque [`Capture`] or [`Backup`].
//!
//! ## What it guarantees
//! - `capture()` never fails and never returns a partial sentinel: a
//!   participant that panics is logged and omitted for that cycle.
//! - Participants are iterated in registration order; because failures are
//!   isolated, ordering only affects log order, never correctness.
//! - The participant list is snapshotted at the start of every CRR call, so
//!   concurrent registration or unregistration cannot race an in-flight
//!   cycle.
//! - A [`Capture`] holds its participants by `Arc`: replaying it keeps
//!   working even if a participant was unregistered in the meantime.
//!
//! ## Instances
//! [`TransmitSet::global`] is the process-wide default used by the decorator
//! layer; tests and embedders construct isolated instances with
//! [`TransmitSet::new`] (slot participant pre-registered) or
//! [`TransmitSet::empty`].
//!
//! ## Example
//! ```
//! use ctxflow::{Slot, TransmitSet};
//!
//! let set = TransmitSet::new();
//! let slot: Slot<u32> = Slot::new();
//!
//! slot.set(7);
//! let capture = set.capture();
//!
//! slot.set(8); // worker-local noise
//! {
//!     let _replayed = set.replayed(&capture);
//!     assert_eq!(slot.get().as_deref(), Some(&7));
//! } // guard dropped: prior state restored
//! assert_eq!(slot.get().as_deref(), Some(&8));
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::thread::LocalKey;

use super::adapter::LocalKeyTransmit;
use super::hook::TransmitHook;
use super::slots::SlotTransmit;
use super::transmit::{Captured, Restorable, Transmit};

/// One registered participant. Adapters carry the identity of the foreign
/// cell they wrap, for duplicate detection.
#[derive(Clone)]
struct Participant {
    transmit: Arc<dyn Transmit>,
    local_key: Option<usize>,
}

/// Immutable snapshot of every participant's state at capture time.
///
/// Cheap to clone and safe to replay any number of times (unless consumed
/// through a `release_after_run` decorator).
#[derive(Clone)]
pub struct Capture {
    entries: Arc<Vec<CaptureEntry>>,
}

#[derive(Clone)]
struct CaptureEntry {
    transmit: Arc<dyn Transmit>,
    payload: Captured,
}

impl Capture {
    /// Number of participants that contributed to this capture.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no participant contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Capture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capture")
            .field("participants", &self.len())
            .finish()
    }
}

/// The state displaced by a `replay`/`clear`, consumed exactly once by
/// [`TransmitSet::restore`]. Deliberately not `Clone`.
pub struct Backup {
    entries: Vec<BackupEntry>,
}

struct BackupEntry {
    transmit: Arc<dyn Transmit>,
    payload: Restorable,
}

impl Backup {
    /// Number of participants that contributed to this backup.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no participant contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Backup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backup")
            .field("participants", &self.len())
            .finish()
    }
}

/// Composite registry of CRR participants.
pub struct TransmitSet {
    participants: RwLock<Vec<Participant>>,
    hooks: RwLock<Vec<Arc<dyn TransmitHook>>>,
}

static GLOBAL: OnceLock<Arc<TransmitSet>> = OnceLock::new();

impl TransmitSet {
    /// Creates a set with the built-in slot participant pre-registered.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let set = Self::empty();
        set.register(Arc::new(SlotTransmit::new()));
        set
    }

    /// Creates a set with no participants at all.
    #[must_use]
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            participants: RwLock::new(Vec::new()),
            hooks: RwLock::new(Vec::new()),
        })
    }

    /// The process-wide default set used by [`wrap`](crate::TransmittingTask::wrap)
    /// and friends when no explicit set is supplied.
    pub fn global() -> &'static Arc<TransmitSet> {
        GLOBAL.get_or_init(TransmitSet::new)
    }

    /// Registers a participant at the end of the iteration order.
    ///
    /// Registering a participant instance that is already present is not an
    /// error: it already takes part in every cycle, so this is a logged
    /// no-op returning `true`.
    pub fn register(&self, transmit: Arc<dyn Transmit>) -> bool {
        let mut participants = self
            .participants
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if participants
            .iter()
            .any(|p| Arc::ptr_eq(&p.transmit, &transmit))
        {
            log::debug!("transmit '{}' already registered; ignoring", transmit.name());
            return true;
        }
        participants.push(Participant {
            transmit,
            local_key: None,
        });
        true
    }

    /// Removes a participant by instance identity. Returns whether it was
    /// present. In-flight cycles that already snapshotted the list (or hold
    /// a capture referencing it) are unaffected.
    pub fn unregister(&self, transmit: &Arc<dyn Transmit>) -> bool {
        let mut participants = self
            .participants
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = participants.len();
        participants.retain(|p| !Arc::ptr_eq(&p.transmit, transmit));
        before != participants.len()
    }

    /// Registers a foreign `thread_local!` cell through a
    /// [`LocalKeyTransmit`] adapter.
    ///
    /// Re-registering the same cell without `force` is a no-op returning
    /// `false`; with `force` the copier is replaced in place (the
    /// participant keeps its position in the iteration order) and `true` is
    /// returned.
    pub fn register_thread_local_like<T: Send + Sync + 'static>(
        &self,
        label: impl Into<std::borrow::Cow<'static, str>>,
        key: &'static LocalKey<RefCell<Option<T>>>,
        copier: impl Fn(&T) -> T + Send + Sync + 'static,
        force: bool,
    ) -> bool {
        let adapter = LocalKeyTransmit::new(label, key, copier);
        let identity = adapter.key_identity();
        let mut participants = self
            .participants
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        match participants
            .iter_mut()
            .find(|p| p.local_key == Some(identity))
        {
            Some(existing) if force => {
                log::debug!(
                    "thread-local '{}' re-registered with force; copier replaced",
                    adapter.name()
                );
                existing.transmit = Arc::new(adapter);
                true
            }
            Some(_) => {
                log::debug!(
                    "thread-local '{}' already registered; ignoring",
                    adapter.name()
                );
                false
            }
            None => {
                participants.push(Participant {
                    transmit: Arc::new(adapter),
                    local_key: Some(identity),
                });
                true
            }
        }
    }

    /// Unregisters a previously adapted `thread_local!` cell. Returns
    /// whether it was present.
    pub fn unregister_thread_local_like<T: Send + Sync + 'static>(
        &self,
        key: &'static LocalKey<RefCell<Option<T>>>,
    ) -> bool {
        let identity = std::ptr::from_ref(key) as usize;
        let mut participants = self
            .participants
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = participants.len();
        participants.retain(|p| p.local_key != Some(identity));
        before != participants.len()
    }

    /// Adds a per-cycle hook at the end of the hook order.
    pub fn add_hook(&self, hook: Arc<dyn TransmitHook>) {
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hook);
    }

    /// Number of registered participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no participant is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshots every participant's state in the calling context.
    ///
    /// A participant that panics is logged and omitted from the capture;
    /// the loop never aborts.
    #[must_use]
    pub fn capture(&self) -> Capture {
        let participants = self.snapshot();
        let mut entries = Vec::with_capacity(participants.len());
        for p in participants {
            if let Some(payload) = isolated_call("capture", p.transmit.name(), || {
                p.transmit.capture()
            }) {
                entries.push(CaptureEntry {
                    transmit: p.transmit,
                    payload,
                });
            }
        }
        Capture {
            entries: Arc::new(entries),
        }
    }

    /// Installs a capture on the calling context, returning the displaced
    /// state as a [`Backup`].
    ///
    /// Only participants present in the capture are touched; a participant
    /// that panics contributes nothing to the backup and is skipped on
    /// restore. Prefer [`replayed`](TransmitSet::replayed) unless you need
    /// to manage the backup yourself; each backup must be restored exactly
    /// once, in a `finally`-equivalent position.
    #[must_use]
    pub fn replay(&self, capture: &Capture) -> Backup {
        self.fire_hooks("before_replay", |h| h.before_replay());
        let mut entries = Vec::with_capacity(capture.entries.len());
        for entry in capture.entries.iter() {
            if let Some(payload) = isolated_call("replay", entry.transmit.name(), || {
                entry.transmit.replay(&entry.payload)
            }) {
                entries.push(BackupEntry {
                    transmit: Arc::clone(&entry.transmit),
                    payload,
                });
            }
        }
        self.fire_hooks("after_replay", |h| h.after_replay());
        Backup { entries }
    }

    /// Empties every registered participant, returning the displaced state.
    ///
    /// Equivalent to replaying an empty capture; used to run housekeeping
    /// bodies with no inherited business context at all.
    #[must_use]
    pub fn clear(&self) -> Backup {
        self.fire_hooks("before_replay", |h| h.before_replay());
        let participants = self.snapshot();
        let mut entries = Vec::with_capacity(participants.len());
        for p in participants {
            if let Some(payload) =
                isolated_call("clear", p.transmit.name(), || p.transmit.clear())
            {
                entries.push(BackupEntry {
                    transmit: p.transmit,
                    payload,
                });
            }
        }
        self.fire_hooks("after_replay", |h| h.after_replay());
        Backup { entries }
    }

    /// Rolls every participating entry back to the backed-up state.
    ///
    /// Must run exactly once per `replay`/`clear`, on the same thread of
    /// control, regardless of how the bracketed body terminated.
    pub fn restore(&self, backup: Backup) {
        self.fire_hooks("before_restore", |h| h.before_restore());
        for entry in backup.entries {
            let name = entry.transmit.name().to_owned();
            let transmit = entry.transmit;
            let payload = entry.payload;
            isolated_call("restore", &name, move || transmit.restore(payload));
        }
        self.fire_hooks("after_restore", |h| h.after_restore());
    }

    /// Replays a capture and returns a guard that restores on drop.
    ///
    /// The guard is the `finally`-equivalent: restore runs on normal return,
    /// early `?`, and unwinding alike.
    #[must_use = "restore runs when the guard drops"]
    pub fn replayed(self: &Arc<Self>, capture: &Capture) -> ReplayGuard {
        ReplayGuard {
            backup: Some(self.replay(capture)),
            set: Arc::clone(self),
        }
    }

    /// Clears every participant and returns a guard that restores on drop.
    #[must_use = "restore runs when the guard drops"]
    pub fn cleared(self: &Arc<Self>) -> ReplayGuard {
        ReplayGuard {
            backup: Some(self.clear()),
            set: Arc::clone(self),
        }
    }

    /// Runs `body` with no inherited context, restoring afterwards.
    ///
    /// # Example
    /// ```
    /// use ctxflow::{Slot, TransmitSet};
    ///
    /// let set = TransmitSet::new();
    /// let slot: Slot<u32> = Slot::new();
    /// slot.set(1);
    ///
    /// set.isolated(|| assert_eq!(slot.get(), None));
    /// assert_eq!(slot.get().as_deref(), Some(&1));
    /// ```
    pub fn isolated<R>(self: &Arc<Self>, body: impl FnOnce() -> R) -> R {
        let _cleared = self.cleared();
        body()
    }

    fn snapshot(&self) -> Vec<Participant> {
        self.participants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fire_hooks(&self, phase: &str, f: impl Fn(&dyn TransmitHook)) {
        let hooks = self
            .hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            isolated_call(phase, hook.name(), || f(hook.as_ref()));
        }
    }
}

/// Restores the displaced state when dropped.
///
/// Holding the guard across the bracketed body is what gives the decorator
/// its replay → body → restore shape.
#[must_use = "restore runs when the guard drops"]
pub struct ReplayGuard {
    backup: Option<Backup>,
    set: Arc<TransmitSet>,
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            self.set.restore(backup);
        }
    }
}

/// Runs one participant or hook call, catching and logging panics so a
/// misbehaving participant never breaks its siblings or the caller.
fn isolated_call<R>(what: &str, who: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(panic) => {
            log::error!("transmit '{who}' panicked during {what}: {}", panic_label(panic.as_ref()));
            None
        }
    }
}

fn panic_label(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "<non-string panic>"
    }
}
