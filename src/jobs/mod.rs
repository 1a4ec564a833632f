//! Scheduled background jobs.
//!
//! Started after the database connects and only when `ENABLE_CRON_JOBS` is
//! `true`. Starting is awaited; each run afterwards is a supervised task. Its
//! errors are logged and never propagated, but a panic stops the server.

pub mod heartbeat;

use std::future::Future;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::JobsConfig;
use crate::db::Database;
use crate::lifecycle::supervisor::TaskSpawner;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid schedule {schedule:?}: {source}")]
    Schedule {
        schedule: String,
        #[source]
        source: JobSchedulerError,
    },

    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Running scheduler; stop it with [`Jobs::shutdown`].
pub struct Jobs {
    scheduler: JobScheduler,
}

pub async fn start_cron_jobs(db: Database, config: &JobsConfig, tasks: TaskSpawner) -> Result<Jobs, JobError> {
    let scheduler = JobScheduler::new().await?;

    let heartbeat = heartbeat::heartbeat_job(&config.heartbeat_cron, db, tasks).map_err(|source| JobError::Schedule {
        schedule: config.heartbeat_cron.clone(),
        source,
    })?;
    scheduler.add(heartbeat).await?;
    scheduler.start().await?;

    tracing::debug!(heartbeat = %config.heartbeat_cron, "Job scheduler running");
    Ok(Jobs { scheduler })
}

/// A cron job whose every run is a supervised task named `name`.
///
/// The scheduler only starts the run; a panic inside it is reported as fatal
/// instead of dying on the scheduler's own task.
pub fn supervised_job<F, Fut>(
    schedule: &str,
    name: &'static str,
    tasks: TaskSpawner,
    mut run: F,
) -> Result<Job, JobSchedulerError>
where
    F: FnMut() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Job::new_async(schedule, move |_uuid, _lock| {
        let tasks = tasks.clone();
        let fut = run();
        Box::pin(async move {
            tasks.spawn_critical(name, fut);
        })
    })
}

impl Jobs {
    pub async fn shutdown(mut self) -> Result<(), JobError> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}
