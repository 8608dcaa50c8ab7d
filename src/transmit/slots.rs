//! # Built-in slot-backed participant.
//!
//! [`SlotTransmit`] transmits the per-context slot map. It is the primary
//! participant and is pre-registered by [`TransmitSet::new`](crate::TransmitSet::new).
//!
//! ## Replay semantics
//! `replay` backs up the destination's *whole* map, then installs exactly
//! the captured entries. A slot that was live on the worker but absent from
//! the capture is therefore cleared for the duration of the replayed body:
//! the destination context never leaks values that only existed locally.
//! `restore` reinstalls the backed-up map wholesale, so the worker's own
//! state comes back bit-for-bit regardless of what the body did.

use std::sync::Arc;

use crate::slots::{
    ContextEntry, ContextMap, install_entries, install_map, snapshot_entries, take_map,
};

use super::transmit::{Captured, Restorable, Transmit};

/// Snapshot of a context's slot entries, copier-applied at capture time.
struct SlotSnapshot {
    entries: Vec<ContextEntry>,
}

/// The built-in participant transmitting slot values.
#[derive(Default)]
pub struct SlotTransmit;

impl SlotTransmit {
    /// Creates the built-in slot participant.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Transmit for SlotTransmit {
    fn name(&self) -> &str {
        "slots"
    }

    fn capture(&self) -> Captured {
        // Copiers are user code: run them after the map borrow is released.
        let raw = snapshot_entries();
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            let value = entry.value.as_ref().map(|v| (entry.core.on_transmit)(v));
            entries.push(ContextEntry {
                core: entry.core,
                value,
            });
        }
        Arc::new(SlotSnapshot { entries })
    }

    fn replay(&self, captured: &Captured) -> Restorable {
        let backup = take_map();
        match captured.downcast_ref::<SlotSnapshot>() {
            Some(snapshot) => install_entries(snapshot.entries.clone()),
            None => {
                log::error!("slots: replay received a foreign payload; context left empty");
            }
        }
        Box::new(backup)
    }

    fn clear(&self) -> Restorable {
        Box::new(take_map())
    }

    fn restore(&self, backup: Restorable) {
        match backup.downcast::<ContextMap>() {
            Ok(map) => install_map(*map),
            Err(_) => {
                log::error!("slots: restore received a foreign payload; context left unchanged");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Slot;

    #[test]
    fn test_capture_excludes_removed_slots() {
        let kept: Slot<u32> = Slot::new();
        let dropped: Slot<u32> = Slot::new();
        kept.set(1);
        dropped.set(2);
        dropped.remove();

        let transmit = SlotTransmit::new();
        let captured = transmit.capture();
        let snapshot = captured.downcast_ref::<SlotSnapshot>().unwrap();

        let ids: Vec<_> = snapshot.entries.iter().map(|e| e.core.id).collect();
        assert!(ids.contains(&kept.id()));
        assert!(!ids.contains(&dropped.id()));
    }

    #[test]
    fn test_replay_installs_and_restore_rolls_back() {
        let slot: Slot<String> = Slot::new();
        let transmit = SlotTransmit::new();

        slot.set("origin".to_string());
        let captured = transmit.capture();

        // Simulate a reused worker with leftover local state.
        slot.set("leftover".to_string());
        let backup = transmit.replay(&captured);
        assert_eq!(slot.get().as_deref().map(String::as_str), Some("origin"));

        slot.set("scribbled-by-body".to_string());
        transmit.restore(backup);
        assert_eq!(slot.get().as_deref().map(String::as_str), Some("leftover"));
    }

    #[test]
    fn test_replay_clears_slots_absent_from_capture() {
        let transmit = SlotTransmit::new();
        let captured = transmit.capture(); // empty context

        let local: Slot<u32> = Slot::new();
        local.set(99);

        let backup = transmit.replay(&captured);
        assert_eq!(local.get(), None);

        transmit.restore(backup);
        assert_eq!(local.get().as_deref(), Some(&99));
    }

    #[test]
    fn test_on_transmit_copier_runs_per_capture() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let slot: Slot<u32> = Slot::builder()
            .on_transmit(|v| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                *v
            })
            .build();
        slot.set(3);

        let transmit = SlotTransmit::new();
        let before = CALLS.load(Ordering::SeqCst);
        let _ = transmit.capture();
        let _ = transmit.capture();
        assert_eq!(CALLS.load(Ordering::SeqCst) - before, 2);
    }
}
