//! Background task scheduler for provider switches.
//!
//! A small worker pool with a FIFO queue and cancellable handles. The
//! cancellation model is dequeue-if-pending only: a task that has not
//! started yet can be removed from the queue, a running task always runs
//! to completion. [`TaskHandle::wait`] blocks until the task has either
//! finished or been cancelled.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

/// Lifecycle of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting in the queue.
    Queued,
    /// Picked up by a worker.
    Running,
    /// Ran to completion.
    Finished,
    /// Dequeued before it started.
    Cancelled,
}

struct TaskShared {
    state: Mutex<TaskState>,
    done: Condvar,
}

impl TaskShared {
    fn settle(&self, state: TaskState) {
        *self.state.lock().unwrap() = state;
        self.done.notify_all();
    }
}

/// Handle to one scheduled task.
#[derive(Clone)]
pub struct TaskHandle {
    shared: Arc<TaskShared>,
}

impl TaskHandle {
    /// Removes the task from the queue if it has not started yet.
    ///
    /// Returns `true` if the task was dequeued. A task that is already
    /// running is left alone; use [`TaskHandle::wait`] to wait it out.
    pub fn cancel_if_queued(&self) -> bool {
        let mut state = self.shared.state.lock().unwrap();
        if *state == TaskState::Queued {
            *state = TaskState::Cancelled;
            self.shared.done.notify_all();
            true
        } else {
            false
        }
    }

    /// Blocks until the task has finished or been cancelled.
    pub fn wait(&self) {
        let mut state = self.shared.state.lock().unwrap();
        while !matches!(*state, TaskState::Finished | TaskState::Cancelled) {
            state = self.shared.done.wait(state).unwrap();
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.shared.state.lock().unwrap()
    }

    /// Whether the task has finished or been cancelled.
    pub fn is_settled(&self) -> bool {
        matches!(self.state(), TaskState::Finished | TaskState::Cancelled)
    }
}

struct Job {
    shared: Arc<TaskShared>,
    run: Box<dyn FnOnce() + Send>,
}

/// Worker pool executing queued tasks in FIFO order.
pub struct TaskPool {
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl TaskPool {
    /// Spawns `workers` worker threads (at least one).
    pub fn new(workers: usize) -> Self {
        let (tx, rx) = channel::<Job>();
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                thread::spawn(move || worker_loop(&rx))
            })
            .collect();

        Self {
            tx: Some(tx),
            workers,
        }
    }

    /// Enqueues a task and returns its handle.
    pub fn push(&self, f: impl FnOnce() + Send + 'static) -> TaskHandle {
        let shared = Arc::new(TaskShared {
            state: Mutex::new(TaskState::Queued),
            done: Condvar::new(),
        });

        let job = Job {
            shared: Arc::clone(&shared),
            run: Box::new(f),
        };

        if let Some(tx) = &self.tx {
            if tx.send(job).is_err() {
                // Workers are gone; settle the handle so wait() returns.
                shared.settle(TaskState::Cancelled);
            }
        }

        TaskHandle { shared }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        // Closing the channel drains the workers.
        self.tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(rx: &Mutex<Receiver<Job>>) {
    loop {
        // Hold the receiver lock only while pulling the next job.
        let job = match rx.lock().unwrap().recv() {
            Ok(job) => job,
            Err(_) => break,
        };

        {
            let mut state = job.shared.state.lock().unwrap();
            match *state {
                TaskState::Queued => *state = TaskState::Running,
                // Dequeued by cancel while it sat in the channel.
                _ => continue,
            }
        }

        // A panicking task must still settle its handle.
        let _ = catch_unwind(AssertUnwindSafe(job.run));
        job.shared.settle(TaskState::Finished);
    }
}
