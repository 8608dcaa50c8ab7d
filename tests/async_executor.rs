//! The future wrapper against a real multi-threaded executor: polls land on
//! arbitrary pooled workers, and the origin's slot values must be visible at
//! every one of them.

use std::time::Duration;

use ctxflow::{Slot, TransmitSet, TransmittingFuture};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slots_visible_across_await_points() {
    let set = TransmitSet::new();
    let tenant: Slot<String> = Slot::new();
    tenant.set("origin".to_string());

    let probe = tenant.clone();
    let fut = TransmittingFuture::with_set(&set, async move {
        let before = probe.get().as_deref().cloned();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after = probe.get().as_deref().cloned();
        (before, after)
    });
    tenant.remove();

    let (before, after) = tokio::spawn(fut).await.unwrap();
    assert_eq!(before.as_deref(), Some("origin"));
    assert_eq!(after.as_deref(), Some("origin"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_state_restored_between_polls() {
    let set = TransmitSet::new();
    let slot: Slot<u32> = Slot::new();

    slot.set(1);
    let probe = slot.clone();
    let wrapped = TransmittingFuture::with_set(&set, async move {
        probe.get().as_deref().copied()
    });

    // The submitting context keeps its own value while the future is in
    // flight and after it completes.
    slot.set(2);
    let seen = wrapped.await;
    assert_eq!(seen, Some(1));
    assert_eq!(slot.get().as_deref(), Some(&2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sibling_futures_share_one_origin_each() {
    let set = TransmitSet::new();
    let slot: Slot<u32> = Slot::new();

    let mut handles = Vec::new();
    for origin in [10, 20] {
        slot.set(origin);
        let probe = slot.clone();
        let fut = TransmittingFuture::with_set(&set, async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            probe.get().as_deref().copied()
        });
        handles.push(tokio::spawn(fut));
    }
    slot.remove();

    let first = handles.remove(0).await.unwrap();
    let second = handles.remove(0).await.unwrap();
    assert_eq!(first, Some(10));
    assert_eq!(second, Some(20));
}
