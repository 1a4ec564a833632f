//! Startup orchestration and the serving loop.
//!
//! # Responsibilities
//! - Connect the database before anything listens
//! - Start scheduled jobs when enabled
//! - Build the application and bind the listener
//! - Serve until a termination signal or a fatal background failure
//! - Drain, stop jobs, close the database
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and nothing is left bound
//! - Listeners start last (traffic only when ready)
//! - Draining is bounded by the configured shutdown timeout

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{Extension, Router};
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};

use crate::config::ServerConfig;
use crate::db::{Database, DatabaseError};
use crate::http::server::build_app;
use crate::jobs::{start_cron_jobs, JobError, Jobs};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::supervisor::{FatalError, TaskSpawner, TaskSupervisor};
use crate::routing::ApiRoutes;
use crate::security::RateLimiter;

/// Failure before the server accepted any traffic.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("failed to start scheduled jobs: {0}")]
    Jobs(#[from] JobError),

    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
}

/// Failure while serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// A started server: database connected, listener bound.
pub struct Server {
    config: Arc<ServerConfig>,
    db: Database,
    jobs: Option<Jobs>,
    listener: TcpListener,
    app: Router,
    limiter: Arc<RateLimiter>,
    shutdown: Shutdown,
    supervisor: TaskSupervisor,
}

enum Stop {
    Signal,
    Fatal(FatalError),
    Served(Result<io::Result<()>, JoinError>),
}

impl Server {
    /// Run the startup sequence. `routes` receives the connected database.
    pub async fn start<F>(config: ServerConfig, routes: F) -> Result<Self, StartupError>
    where
        F: FnOnce(&Database, &ServerConfig) -> ApiRoutes,
    {
        let config = Arc::new(config);
        let supervisor = TaskSupervisor::new();

        let db = Database::connect(&config.database).await?;
        tracing::info!(backend = ?db.backend(), "Database connected");

        let jobs = if config.enable_cron_jobs {
            match start_cron_jobs(db.clone(), &config.jobs, supervisor.spawner()).await {
                Ok(jobs) => {
                    tracing::info!(heartbeat = %config.jobs.heartbeat_cron, "Cron jobs started");
                    Some(jobs)
                }
                Err(e) => {
                    close_quietly(db).await;
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let app = build_app(&config, limiter.clone(), routes(&db, &config)).layer(Extension(supervisor.spawner()));

        let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                if let Some(jobs) = jobs {
                    let _ = jobs.shutdown().await;
                }
                close_quietly(db).await;
                return Err(StartupError::Bind {
                    port: config.port,
                    source,
                });
            }
        };

        let port = listener.local_addr().map(|a| a.port()).unwrap_or(config.port);
        tracing::info!(
            port,
            environment = config.environment_name(),
            url = %config.public_url(),
            "Server started"
        );

        Ok(Self {
            config,
            db,
            jobs,
            listener,
            app,
            limiter,
            shutdown: Shutdown::new(),
            supervisor,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle for background work that must stop the server if it panics.
    /// Handlers receive the same handle as `Extension<TaskSpawner>`.
    pub fn spawner(&self) -> TaskSpawner {
        self.supervisor.spawner()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve until `signal` resolves or a background task fails.
    ///
    /// On signal, in-flight requests get up to the shutdown timeout to
    /// finish. A fatal failure stops immediately and is returned as an error.
    pub async fn run<S>(self, signal: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let Server {
            config,
            db,
            jobs,
            listener,
            app,
            limiter,
            shutdown,
            mut supervisor,
        } = self;

        supervisor.spawn_critical("rate-limit-sweeper", limiter.run_sweeper(shutdown.subscribe()));

        let stopped = shutdown.subscribe();
        let mut server: JoinHandle<io::Result<()>> = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(stopped.wait())
                .await
        });

        let stop = tokio::select! {
            () = signal => Stop::Signal,
            fatal = supervisor.next_fatal() => Stop::Fatal(fatal),
            served = &mut server => Stop::Served(served),
        };
        shutdown.trigger();

        let result = match stop {
            Stop::Signal => {
                tracing::info!("Shutdown signal received, draining connections");
                drain(server, config.shutdown_timeout()).await
            }
            Stop::Fatal(fatal) => {
                tracing::error!(error = %fatal, "Fatal error, stopping server");
                server.abort();
                // Wait for the cancelled task so the listener is closed on return.
                let _ = server.await;
                Err(fatal.into())
            }
            Stop::Served(served) => {
                tracing::error!("HTTP server stopped unexpectedly");
                served_result(served)
            }
        };

        if let Some(jobs) = jobs {
            if let Err(e) = jobs.shutdown().await {
                tracing::warn!(error = %e, "Failed to stop scheduled jobs");
            }
        }
        close_quietly(db).await;

        tracing::info!("Shutdown complete");
        result
    }
}

async fn drain(mut server: JoinHandle<io::Result<()>>, timeout: Duration) -> Result<(), ServerError> {
    match tokio::time::timeout(timeout, &mut server).await {
        Ok(served) => served_result(served),
        Err(_) => {
            tracing::warn!(
                timeout_secs = timeout.as_secs(),
                "Drain timed out, dropping open connections"
            );
            server.abort();
            Ok(())
        }
    }
}

fn served_result(served: Result<io::Result<()>, JoinError>) -> Result<(), ServerError> {
    match served {
        Ok(result) => result.map_err(ServerError::from),
        Err(e) => Err(ServerError::Fatal(FatalError {
            task: "http-server",
            reason: e.to_string(),
        })),
    }
}

async fn close_quietly(db: Database) {
    if let Err(e) = db.close().await {
        tracing::warn!(error = %e, "Failed to close database");
    }
}
