//! Plugs a legacy `thread_local!` value into the CRR protocol through the
//! adapter, next to the built-in slot participant.
//!
//! Run with: `cargo run --example custom_transmit`

use std::cell::RefCell;

use ctxflow::{Slot, TaskFn, TransmitSet, TransmittingTask, WorkerBuilder, WrapOptions};

thread_local! {
    // Pretend this belongs to a library we cannot change.
    static LOCALE: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn main() {
    env_logger::init();

    let set = TransmitSet::new();
    let registered = set.register_thread_local_like("locale", &LOCALE, String::clone, false);
    println!("locale adapter registered: {registered}");

    let user: Slot<String> = Slot::builder().label("user").build();
    user.set("alice".to_string());
    LOCALE.with(|c| *c.borrow_mut() = Some("de-DE".to_string()));

    let probe = user.clone();
    let task = TransmittingTask::wrap_with(
        &set,
        TaskFn::arc("greeter", move || {
            let locale = LOCALE.with(|c| c.borrow().clone());
            println!(
                "worker sees user={:?} locale={:?}",
                probe.get().as_deref(),
                locale
            );
            Ok(())
        }),
        WrapOptions::default(),
    )
    .expect("freshly built task is not wrapped yet");

    // A clean worker: both the slot and the legacy value arrive with the task.
    let worker = WorkerBuilder::new()
        .inherit(false)
        .spawn(move || task.run())
        .expect("spawn worker");
    worker.join().expect("worker finished").expect("task ran");
}
