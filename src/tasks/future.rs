//! # Future wrapper: context preserved across executor boundaries.
//!
//! Pooled async executors migrate tasks between worker threads and do not
//! preserve thread-scoped state between polls. [`TransmittingFuture`]
//! captures the submitting context at construction and brackets **every
//! poll** with replay/restore, so the wrapped future always observes the
//! origin's slot values no matter which worker polls it, and each worker's
//! own state is put back before the executor regains control.
//!
//! ## Example
//! ```
//! use ctxflow::{Slot, TransmitSet, TransmittingFuture};
//!
//! # async fn demo() {
//! let set = TransmitSet::new();
//! let tenant: Slot<String> = Slot::new();
//! tenant.set("acme".to_string());
//!
//! let probe = tenant.clone();
//! let fut = TransmittingFuture::with_set(&set, async move {
//!     // polls may land on any worker thread; the slot is still visible
//!     probe.get().as_deref().cloned()
//! });
//!
//! tenant.remove(); // origin moves on; the capture already holds "acme"
//! assert_eq!(fut.await, Some("acme".to_string()));
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use crate::transmit::{Capture, TransmitSet};

/// A [`Future`] wrapper replaying the origin's capture around each poll.
pub struct TransmittingFuture<F> {
    set: Arc<TransmitSet>,
    capture: Capture,
    inner: F,
}

impl<F> TransmittingFuture<F> {
    /// Wraps a future against the process-wide default set, capturing the
    /// calling context immediately.
    pub fn new(inner: F) -> Self {
        Self::with_set(TransmitSet::global(), inner)
    }

    /// Wraps a future against an explicit set.
    pub fn with_set(set: &Arc<TransmitSet>, inner: F) -> Self {
        Self {
            set: Arc::clone(set),
            capture: set.capture(),
            inner,
        }
    }

    /// Consumes the wrapper, returning the inner future.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F> Future for TransmittingFuture<F>
where
    F: Future,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Structural pinning of `inner` only; `set` and `capture` are never
        // moved out of the pinned struct.
        let (set, capture, inner) = unsafe {
            let this = self.get_unchecked_mut();
            (
                Arc::clone(&this.set),
                this.capture.clone(),
                Pin::new_unchecked(&mut this.inner),
            )
        };
        let _replayed = set.replayed(&capture);
        inner.poll(cx)
    }
}
