//! Graceful shutdown signal handling.

use std::io;

use thiserror::Error;
use tokio::signal;
use tracing::{error, info};

/// A signal handler could not be installed.
#[derive(Debug, Error)]
pub enum ShutdownSignalError {
    /// Ctrl+C handler.
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    /// SIGTERM handler.
    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
///
/// # Errors
///
/// Returns an error if a handler cannot be installed.
pub async fn listen() -> Result<(), ShutdownSignalError> {
    let ctrl_c = async { signal::ctrl_c().await.map_err(ShutdownSignalError::CtrlC) };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .map_err(ShutdownSignalError::SigTerm)?
            .recv()
            .await;
        Ok::<(), ShutdownSignalError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), ShutdownSignalError>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Ctrl+C received");
        }
        result = terminate => {
            result?;
            info!("SIGTERM received");
        }
    }
    Ok(())
}

/// [`listen`] for use with `with_graceful_shutdown`. If no handler can be
/// installed the server keeps running until killed.
pub async fn signal() {
    if let Err(e) = listen().await {
        error!(error = %e, "Graceful shutdown unavailable");
        std::future::pending::<()>().await;
    }
}
