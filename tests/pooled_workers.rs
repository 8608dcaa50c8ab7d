//! End-to-end scenarios over a simulated reused worker: a single long-lived
//! thread executes submissions from several origins, with its own local
//! state that must survive every one of them.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use ctxflow::{
    Slot, TaskFn, TaskRef, TransmitSet, TransmittingTask, WorkerBuilder, WrapOptions,
};

/// A minimal pool: one reused worker draining a queue of tasks.
struct MiniPool {
    sender: mpsc::Sender<TaskRef>,
    handle: std::thread::JoinHandle<()>,
}

impl MiniPool {
    fn start() -> Self {
        let (sender, receiver) = mpsc::channel::<TaskRef>();
        let handle = WorkerBuilder::new()
            .name("mini-pool-worker")
            .inherit(false)
            .spawn(move || {
                for task in receiver {
                    let _ = task.run();
                }
            })
            .unwrap();
        Self { sender, handle }
    }

    fn submit(&self, task: TaskRef) {
        self.sender.send(task).unwrap();
    }

    fn shutdown(self) {
        drop(self.sender);
        self.handle.join().unwrap();
    }
}

#[test]
fn test_values_flow_with_tasks_not_with_the_worker() {
    let set = TransmitSet::new();
    let request: Slot<String> = Slot::new();
    let pool = MiniPool::start();
    let observed = Arc::new(Mutex::new(Vec::new()));

    for origin in ["first", "second", "third"] {
        request.set(origin.to_string());
        let probe = request.clone();
        let sink = Arc::clone(&observed);
        let task = TransmittingTask::wrap_with(
            &set,
            TaskFn::arc("handler", move || {
                sink.lock().unwrap().push(probe.get().as_deref().cloned());
                Ok(())
            }),
            WrapOptions::default(),
        )
        .unwrap();
        pool.submit(task);
    }

    pool.shutdown();
    assert_eq!(
        *observed.lock().unwrap(),
        vec![
            Some("first".to_string()),
            Some("second".to_string()),
            Some("third".to_string()),
        ]
    );
}

#[test]
fn test_worker_local_state_survives_foreign_captures() {
    let set = TransmitSet::new();
    let request: Slot<String> = Slot::new();
    let scratch: Slot<u32> = Slot::new();
    let pool = MiniPool::start();
    let observed = Arc::new(Mutex::new(Vec::new()));

    // The worker establishes local state of its own.
    {
        let scratch = scratch.clone();
        pool.submit(TaskFn::arc("warmup", move || {
            scratch.set(1234);
            Ok(())
        }));
    }

    // A foreign submission whose capture knows nothing about `scratch`.
    request.set("incoming".to_string());
    {
        let request = request.clone();
        let scratch = scratch.clone();
        let sink = Arc::clone(&observed);
        let task = TransmittingTask::wrap_with(
            &set,
            TaskFn::arc("foreign", move || {
                // during replay the worker's scratch value must be hidden
                sink.lock()
                    .unwrap()
                    .push((request.get().as_deref().cloned(), scratch.get().as_deref().copied()));
                Ok(())
            }),
            WrapOptions::default(),
        )
        .unwrap();
        pool.submit(task);
    }

    // After restore, the worker sees its scratch value again.
    {
        let scratch = scratch.clone();
        let sink = Arc::clone(&observed);
        pool.submit(TaskFn::arc("check", move || {
            sink.lock()
                .unwrap()
                .push((None, scratch.get().as_deref().copied()));
            Ok(())
        }));
    }

    pool.shutdown();
    assert_eq!(
        *observed.lock().unwrap(),
        vec![
            (Some("incoming".to_string()), None),
            (None, Some(1234)),
        ]
    );
}

#[test]
fn test_one_shot_submission_runs_exactly_once() {
    let set = TransmitSet::new();
    let bodies = Arc::new(Mutex::new(0u32));
    let seen = Arc::clone(&bodies);
    let task = TransmittingTask::wrap_with(
        &set,
        TaskFn::arc("one-shot", move || {
            *seen.lock().unwrap() += 1;
            Ok(())
        }),
        WrapOptions {
            release_after_run: true,
            ..WrapOptions::default()
        },
    )
    .unwrap();

    let pool = MiniPool::start();
    // Submitted twice by mistake; the second run must not reach the body.
    pool.submit(Arc::clone(&task));
    pool.submit(task);
    pool.shutdown();

    assert_eq!(*bodies.lock().unwrap(), 1);
}

#[test]
fn test_housekeeping_runs_without_inherited_context() {
    let set = TransmitSet::new();
    let tenant: Slot<String> = Slot::new();
    tenant.set("acme".to_string());

    let probe = tenant.clone();
    let seen = set.isolated(move || probe.get().as_deref().cloned());
    assert_eq!(seen, None);
    assert_eq!(tenant.get().as_deref().map(String::as_str), Some("acme"));
}
