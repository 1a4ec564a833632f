//! OS signal handling.
//!
//! SIGTERM and Ctrl-C both request a graceful shutdown.

/// Signal that ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Terminate,
    Interrupt,
}

/// Wait for SIGTERM (unix) or Ctrl-C.
pub async fn termination_signal() -> TerminationSignal {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = ctrl_c => TerminationSignal::Interrupt,
        () = terminate => TerminationSignal::Terminate,
    };

    match signal {
        TerminationSignal::Terminate => tracing::info!("SIGTERM received, shutting down gracefully"),
        TerminationSignal::Interrupt => tracing::info!("Interrupt received, shutting down gracefully"),
    }
    signal
}
