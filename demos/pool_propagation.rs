//! Submits decorated tasks to a tiny hand-rolled pool and shows the
//! submitting context flowing with each task while the workers stay clean.
//!
//! Run with: `cargo run --example pool_propagation`

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use ctxflow::{Slot, TaskFn, TaskRef, TransmittingTask, WorkerBuilder, WrapOptions};

fn main() {
    env_logger::init();

    let request_id: Slot<u64> = Slot::builder().label("request-id").build();

    // Two pooled workers, started clean: no ambient inheritance.
    let (sender, receiver) = mpsc::channel::<TaskRef>();
    let receiver = Arc::new(Mutex::new(receiver));
    let workers: Vec<_> = (0..2)
        .map(|i| {
            let receiver = Arc::clone(&receiver);
            WorkerBuilder::new()
                .name(format!("pool-worker-{i}"))
                .inherit(false)
                .spawn(move || {
                    loop {
                        let task = {
                            let guard = receiver.lock().unwrap();
                            guard.recv()
                        };
                        match task {
                            Ok(task) => {
                                let _ = task.run();
                            }
                            Err(_) => break,
                        }
                    }
                })
                .unwrap()
        })
        .collect();

    for id in 1..=5u64 {
        request_id.set(id);
        let probe = request_id.clone();
        let task = TransmittingTask::wrap(
            TaskFn::arc("handle-request", move || {
                println!(
                    "[{}] handling request {:?}",
                    std::thread::current().name().unwrap_or("?"),
                    probe.get().as_deref()
                );
                Ok(())
            }),
            WrapOptions::default(),
        )
        .expect("freshly built task is not wrapped yet");
        sender.send(task).expect("workers are alive");
    }

    drop(sender);
    for worker in workers {
        let _ = worker.join();
    }
}
