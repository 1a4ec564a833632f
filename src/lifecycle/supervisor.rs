//! Supervision of background tasks.
//!
//! A background task that panics has no caller to report to. Tasks spawned
//! here are watched instead, and a panic is forwarded as a [`FatalError`]
//! that ends the server with a failure exit status.

use std::future::Future;

use tokio::sync::mpsc;

/// A supervised task died.
#[derive(Debug, Clone, thiserror::Error)]
#[error("background task {task} failed: {reason}")]
pub struct FatalError {
    pub task: &'static str,
    pub reason: String,
}

/// Cloneable handle for spawning supervised tasks.
///
/// Handed to request handlers as an `Extension<TaskSpawner>` and used by the
/// job scheduler, so work started outside the request path still reports
/// panics to the server.
#[derive(Debug, Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<FatalError>,
}

impl TaskSpawner {
    /// Spawn `task`; a panic inside it becomes fatal.
    pub fn spawn_critical<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            match handle.await {
                Ok(()) => tracing::debug!(task = name, "Background task finished"),
                Err(e) if e.is_cancelled() => tracing::debug!(task = name, "Background task cancelled"),
                Err(e) => {
                    let reason = panic_message(e.into_panic());
                    tracing::error!(task = name, reason = %reason, "Background task panicked");
                    let _ = tx.send(FatalError { task: name, reason });
                }
            }
        });
    }
}

pub struct TaskSupervisor {
    spawner: TaskSpawner,
    rx: mpsc::UnboundedReceiver<FatalError>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            spawner: TaskSpawner { tx },
            rx,
        }
    }

    pub fn spawner(&self) -> TaskSpawner {
        self.spawner.clone()
    }

    pub fn spawn_critical<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawner.spawn_critical(name, task);
    }

    /// Wait for the next fatal failure. Pending forever if none occurs.
    pub async fn next_fatal(&mut self) -> FatalError {
        match self.rx.recv().await {
            Some(fatal) => fatal,
            // The supervisor holds a sender, so the channel never closes.
            None => std::future::pending().await,
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Log every panic through tracing before the default unwinding proceeds.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        tracing::error!(location = %location, "Panic: {message}");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn panicking_task_is_reported() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn_critical("exploder", async {
            panic!("cron store corrupted");
        });

        let fatal = tokio::time::timeout(Duration::from_secs(1), supervisor.next_fatal())
            .await
            .expect("fatal error should be reported");
        assert_eq!(fatal.task, "exploder");
        assert_eq!(fatal.reason, "cron store corrupted");
    }

    #[tokio::test]
    async fn spawner_clones_report_to_the_supervisor() {
        let mut supervisor = TaskSupervisor::new();
        let spawner = supervisor.spawner();
        drop(tokio::spawn(async move {
            spawner.spawn_critical("handler-task", async {
                panic!("badge award lost");
            });
        }));

        let fatal = tokio::time::timeout(Duration::from_secs(1), supervisor.next_fatal())
            .await
            .expect("fatal error should be reported");
        assert_eq!(fatal.task, "handler-task");
        assert_eq!(fatal.reason, "badge award lost");
    }

    #[tokio::test]
    async fn finished_task_is_not_fatal() {
        let mut supervisor = TaskSupervisor::new();
        supervisor.spawn_critical("quick", async {});

        let outcome = tokio::time::timeout(Duration::from_millis(200), supervisor.next_fatal()).await;
        assert!(outcome.is_err());
    }
}
