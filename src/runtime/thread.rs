use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::hook::{report, ResultCallback};

pub type Task = Box<dyn FnOnce() + Send + 'static>;

enum Envelope {
    Run(Task),
    Quit,
}

/// Posting handle for an [`EventThread`].
#[derive(Clone)]
pub struct TaskRunner {
    name: Arc<str>,
    thread_id: ThreadId,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl TaskRunner {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn runs_tasks_on_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queues `task`; returns `false` once the thread has stopped accepting work.
    pub fn post<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.tx.send(Envelope::Run(Box::new(task))) {
            Ok(()) => true,
            Err(_) => {
                warn!(target: "event_thread", thread = %self.name, "dropping task posted after shutdown");
                false
            }
        }
    }

    /// Queues `task` together with the callback it is responsible for.
    ///
    /// If the task cannot be queued the callback receives `false` at once.
    pub fn post_with_callback<F>(&self, on_result: Option<ResultCallback>, task: F) -> bool
    where
        F: FnOnce(Option<ResultCallback>) + Send + 'static,
    {
        let slot = Arc::new(Mutex::new(on_result));
        let queued = Arc::clone(&slot);
        let posted = self.post(move || {
            let on_result = queued.lock().take();
            task(on_result);
        });
        if !posted {
            report(slot.lock().take(), false);
        }
        posted
    }

    /// Runs `task` on the thread and waits for its value.
    ///
    /// Runs inline when called from the thread itself. `None` means the
    /// task never ran.
    pub fn post_and_wait<F, R>(&self, task: F) -> Option<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.runs_tasks_on_current_thread() {
            return Some(task());
        }

        let (tx, rx) = oneshot::channel();
        let posted = self.post(move || {
            let _ = tx.send(task());
        });
        if !posted {
            return None;
        }
        rx.blocking_recv().ok()
    }
}

/// Named OS thread that runs posted tasks in FIFO order.
pub struct EventThread {
    runner: TaskRunner,
    join: Option<JoinHandle<()>>,
}

impl EventThread {
    pub fn spawn(name: &str) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let thread_name = name.to_string();
        let join = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!(target: "event_thread", thread = %thread_name, "event thread started");
                while let Some(envelope) = rx.blocking_recv() {
                    match envelope {
                        Envelope::Run(task) => task(),
                        Envelope::Quit => break,
                    }
                }
                rx.close();
                debug!(target: "event_thread", thread = %thread_name, "event thread stopped");
            })
            .with_context(|| format!("failed to spawn event thread `{name}`"))?;

        let runner = TaskRunner {
            name: Arc::from(name),
            thread_id: join.thread().id(),
            tx,
        };

        Ok(Self {
            runner,
            join: Some(join),
        })
    }

    pub fn runner(&self) -> TaskRunner {
        self.runner.clone()
    }

    /// Stops after the tasks already queued; later posts fail.
    pub fn shutdown(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };

        let _ = self.runner.tx.send(Envelope::Quit);
        if join.thread().id() == thread::current().id() {
            warn!(target: "event_thread", thread = %self.runner.name, "event thread shut down from itself; not joining");
            return;
        }
        if join.join().is_err() {
            warn!(target: "event_thread", thread = %self.runner.name, "event thread panicked");
        }
    }
}

impl Drop for EventThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Records the one thread allowed to touch a value.
#[derive(Debug, Clone, Copy)]
pub struct ThreadBinding {
    owner: ThreadId,
}

impl ThreadBinding {
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    pub fn bound_to(owner: ThreadId) -> Self {
        Self { owner }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    #[track_caller]
    pub fn assert_current(&self) {
        debug_assert!(
            self.is_current(),
            "called off its designated thread ({:?})",
            self.owner
        );
    }
}
