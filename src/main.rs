//! Drept Academy API server binary.
//!
//! # Startup
//!
//! ```text
//!   .env → logging → environment → config
//!     → database → cron jobs (ENABLE_CRON_JOBS=true)
//!     → listener on 0.0.0.0:PORT
//!     → serve until SIGTERM / Ctrl-C
//! ```
//!
//! Exit status is `0` after a graceful shutdown and `1` when startup fails
//! or a background task dies.

use std::process::ExitCode;

use drept_academy_api::config::loader;
use drept_academy_api::lifecycle::{install_panic_hook, termination_signal, Server};
use drept_academy_api::observability::init_logging;
use drept_academy_api::routing::ApiRoutes;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    // Before loading, so warnings about ignored settings are not lost.
    init_logging(std::env::var("NODE_ENV").is_ok_and(|env| env == "production"));
    install_panic_hook();

    let config = match loader::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment_name(),
        "drept-academy-api starting"
    );

    let server = match Server::start(config, ApiRoutes::standard).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Server startup failed");
            return ExitCode::FAILURE;
        }
    };

    match server
        .run(async {
            termination_signal().await;
        })
        .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}
