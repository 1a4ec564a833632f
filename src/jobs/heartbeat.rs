//! Periodic database heartbeat.

use tokio_cron_scheduler::{Job, JobSchedulerError};

use crate::db::Database;
use crate::jobs::supervised_job;
use crate::lifecycle::supervisor::TaskSpawner;

/// Ping the database on `schedule` and log the outcome.
pub fn heartbeat_job(schedule: &str, db: Database, tasks: TaskSpawner) -> Result<Job, JobSchedulerError> {
    supervised_job(schedule, "db-heartbeat", tasks, move || {
        let db = db.clone();
        async move {
            match db.ping().await {
                Ok(()) => tracing::debug!("Database heartbeat ok"),
                Err(e) => tracing::error!(error = %e, "Database heartbeat failed"),
            }
        }
    })
}
