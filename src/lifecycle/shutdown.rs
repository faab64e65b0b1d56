//! Background task coordination.
//!
//! # Responsibilities
//! - Broadcast one shutdown signal to every background task
//! - Track spawned tasks and wait for them to finish, with a deadline

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::app::Framework;

/// Owns the shutdown channel and the tasks listening on it.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            tasks: Vec::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Wait for `task` during [`Shutdown::stop`].
    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Spawn the framework's cache sweeper and track it.
    pub fn start_sweeper(&mut self, framework: &Framework) {
        let task = framework.spawn_sweeper(self.subscribe());
        self.track(task);
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Signal shutdown and wait for tracked tasks. Tasks still running at the
    /// deadline are aborted; returns false in that case.
    pub async fn stop(self, deadline: Duration) -> bool {
        let _ = self.tx.send(());
        let total = self.tasks.len();

        let mut clean = true;
        for mut task in self.tasks {
            if tokio::time::timeout(deadline, &mut task).await.is_err() {
                task.abort();
                clean = false;
            }
        }

        if clean {
            tracing::info!(tasks = total, "Background tasks stopped");
        } else {
            tracing::warn!(tasks = total, "Background tasks aborted at shutdown deadline");
        }
        clean
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_waits_for_listeners() {
        let mut shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        shutdown.track(tokio::spawn(async move {
            let _ = rx.recv().await;
        }));
        assert_eq!(shutdown.task_count(), 1);
        assert!(shutdown.stop(Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_stuck_task_is_aborted() {
        let mut shutdown = Shutdown::new();
        shutdown.track(tokio::spawn(std::future::pending::<()>()));
        assert!(!shutdown.stop(Duration::from_millis(20)).await);
    }
}
