//! Named tasks with completion dependencies.
//!
//! # Responsibilities
//! - Start every registered task together when the group completes
//! - Start a waiter once the task it waits for has finished
//! - Report begin and end per task, then one completion
//!
//! # Design Decisions
//! - A future finishing is the completion signal; there is no done callback
//! - Registering a name twice replaces the earlier future
//! - A panicking task is reported as failed and does not release its waiters
//! - Waiters whose dependency never finishes are reported as skipped, so `complete` always returns

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::observability::metrics;

/// Progress notifications from a running [`TaskGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Begin(String),
    End(String),
    /// Everything that could run has finished.
    Complete,
}

/// What happened to each task of a completed group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Names in the order they finished.
    pub finished: Vec<String>,
    pub failed: Vec<String>,
    /// Waiters that never started, sorted by name.
    pub skipped: Vec<String>,
}

impl TaskReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

type Task = BoxFuture<'static, ()>;
type Listener = Arc<dyn Fn(&TaskEvent) + Send + Sync>;
type Joined = (String, std::thread::Result<()>);

/// A set of named futures, some of which wait for others.
#[derive(Default)]
pub struct TaskGroup {
    pending: Vec<(String, Task)>,
    waiting: HashMap<String, Vec<(String, Task)>>,
    listeners: Vec<Listener>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&TaskEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Register a task started by [`TaskGroup::complete`].
    pub fn task<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let future = future.boxed();
        match self.pending.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = future,
            None => self.pending.push((name, future)),
        }
        self
    }

    /// Register a task under a generated name and return that name.
    pub fn unnamed<F>(&mut self, future: F) -> String
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = Uuid::new_v4().simple().to_string();
        self.task(name.clone(), future);
        name
    }

    /// Run `future` as `name` once `waiting_for` has finished.
    pub fn wait<F>(
        &mut self,
        name: impl Into<String>,
        waiting_for: impl Into<String>,
        future: F,
    ) -> &mut Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.waiting
            .entry(waiting_for.into())
            .or_default()
            .push((name.into(), future.boxed()));
        self
    }

    /// Like [`TaskGroup::wait`] with a generated name, which is returned.
    pub fn then<F>(&mut self, waiting_for: impl Into<String>, future: F) -> String
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = Uuid::new_v4().simple().to_string();
        self.wait(name.clone(), waiting_for, future);
        name
    }

    /// Registered tasks and waiters not yet started.
    pub fn len(&self) -> usize {
        self.pending.len() + self.waiting.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start every task, release waiters as their dependencies finish, and
    /// call `on_complete` once nothing is left to start.
    pub async fn complete<F>(mut self, on_complete: F) -> TaskReport
    where
        F: FnOnce(&TaskReport),
    {
        let mut running: JoinSet<Joined> = JoinSet::new();
        let mut report = TaskReport::default();

        for (name, future) in std::mem::take(&mut self.pending) {
            self.start(&mut running, name, future);
        }

        while let Some(joined) = running.join_next().await {
            let (name, outcome) = match joined {
                Ok(joined) => joined,
                Err(e) => {
                    tracing::warn!(error = %e, "Task was cancelled");
                    continue;
                }
            };

            if outcome.is_err() {
                tracing::warn!(task = %name, "Task panicked");
                metrics::record_task("failed");
                report.failed.push(name);
                continue;
            }

            tracing::debug!(task = %name, "Task finished");
            metrics::record_task("ok");
            self.emit(&TaskEvent::End(name.clone()));
            for (waiter, future) in self.waiting.remove(&name).unwrap_or_default() {
                self.start(&mut running, waiter, future);
            }
            report.finished.push(name);
        }

        report.skipped = self
            .waiting
            .drain()
            .flat_map(|(_, waiters)| waiters.into_iter().map(|(name, _)| name))
            .collect();
        report.skipped.sort();
        if !report.skipped.is_empty() {
            tracing::warn!(skipped = ?report.skipped, "Waiters never started");
        }

        on_complete(&report);
        self.emit(&TaskEvent::Complete);
        report
    }

    fn start(&self, running: &mut JoinSet<Joined>, name: String, future: Task) {
        tracing::debug!(task = %name, "Task started");
        self.emit(&TaskEvent::Begin(name.clone()));
        running.spawn(async move {
            let outcome = AssertUnwindSafe(future).catch_unwind().await;
            (name, outcome)
        });
    }

    fn emit(&self, event: &TaskEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending: Vec<&str> = self.pending.iter().map(|(name, _)| name.as_str()).collect();
        let waiting: HashMap<&str, usize> = self
            .waiting
            .iter()
            .map(|(name, waiters)| (name.as_str(), waiters.len()))
            .collect();
        f.debug_struct("TaskGroup")
            .field("pending", &pending)
            .field("waiting", &waiting)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
