//! # Adapter for foreign thread-local values.
//!
//! Code that already keeps per-thread state in its own `thread_local!` and
//! cannot migrate to [`Slot`](crate::Slot) can still participate in CRR:
//! [`LocalKeyTransmit`] wraps a `&'static LocalKey<RefCell<Option<T>>>`
//! together with an explicit copier.
//!
//! The copier runs once per capture and once per replay materialization
//! (each replay needs an owned `T` for the destination cell, and a capture
//! may be replayed many times).
//!
//! Registration normally goes through
//! [`TransmitSet::register_thread_local_like`](crate::TransmitSet::register_thread_local_like),
//! which deduplicates by key identity and supports copier replacement via
//! `force`.

use std::borrow::Cow;
use std::cell::RefCell;
use std::sync::Arc;
use std::thread::LocalKey;

use super::transmit::{Captured, Restorable, Transmit};

/// Participant adapting a foreign `thread_local!` cell to the CRR protocol.
pub struct LocalKeyTransmit<T: Send + Sync + 'static> {
    label: Cow<'static, str>,
    key: &'static LocalKey<RefCell<Option<T>>>,
    copier: Arc<dyn Fn(&T) -> T + Send + Sync>,
}

struct LocalSnapshot<T>(Option<T>);
struct LocalBackup<T>(Option<T>);

impl<T: Send + Sync + 'static> LocalKeyTransmit<T> {
    /// Wraps a foreign thread-local cell with an explicit copier.
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        key: &'static LocalKey<RefCell<Option<T>>>,
        copier: impl Fn(&T) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            key,
            copier: Arc::new(copier),
        }
    }

    /// Identity of the wrapped cell; used for duplicate detection.
    pub(crate) fn key_identity(&self) -> usize {
        std::ptr::from_ref(self.key) as usize
    }
}

impl<T: Send + Sync + 'static> Transmit for LocalKeyTransmit<T> {
    fn name(&self) -> &str {
        &self.label
    }

    fn capture(&self) -> Captured {
        let copied = self
            .key
            .with(|cell| cell.borrow().as_ref().map(|v| (self.copier)(v)));
        Arc::new(LocalSnapshot(copied))
    }

    fn replay(&self, captured: &Captured) -> Restorable {
        let incoming = match captured.downcast_ref::<LocalSnapshot<T>>() {
            Some(snapshot) => snapshot.0.as_ref().map(|v| (self.copier)(v)),
            None => {
                log::error!("{}: replay received a foreign payload; cell cleared", self.label);
                None
            }
        };
        let prior = self.key.with(|cell| cell.replace(incoming));
        Box::new(LocalBackup(prior))
    }

    fn clear(&self) -> Restorable {
        let prior = self.key.with(|cell| cell.take());
        Box::new(LocalBackup(prior))
    }

    fn restore(&self, backup: Restorable) {
        match backup.downcast::<LocalBackup<T>>() {
            Ok(prior) => self.key.with(|cell| *cell.borrow_mut() = prior.0),
            Err(_) => {
                log::error!("{}: restore received a foreign payload; cell left unchanged", self.label);
            }
        }
    }
}
