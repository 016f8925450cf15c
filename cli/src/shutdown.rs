//! Stopping a waiting `bgv verify --wait` on Ctrl-C or SIGTERM.
//!
//! The guard tears the engine down when a signal arrives, so no scheduled
//! retry fires after the process decided to exit. The waiting loop only has
//! to notice [`VerificationEngine::is_torn_down`].

use std::future::Future;
use std::sync::Arc;

use bgv_protocol::Transport;
use bgv_store::VerificationStore;
use bgv_verification::VerificationEngine;
use tokio::signal;
use tokio::task::JoinHandle;

/// Tears `engine` down when `signal` resolves. Dropping the guard disarms it.
pub struct TeardownGuard {
    task: JoinHandle<()>,
}

impl TeardownGuard {
    pub fn on_signal<T, S>(engine: Arc<VerificationEngine<T, S>>) -> Self
    where
        T: Transport + 'static,
        S: VerificationStore + 'static,
    {
        Self::on(engine, termination())
    }

    pub fn on<T, S, F>(engine: Arc<VerificationEngine<T, S>>, signal: F) -> Self
    where
        T: Transport + 'static,
        S: VerificationStore + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            signal.await;
            let canceled = engine.teardown();
            tracing::info!(canceled, "stopped before pending retries ran");
        });
        Self { task }
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Resolves on SIGINT or SIGTERM. A handler that cannot be installed never
/// fires.
async fn termination() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("received SIGINT, shutting down"); }
        _ = terminate => { tracing::info!("received SIGTERM, shutting down"); }
    }
}
