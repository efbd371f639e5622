//! Server setup and lifecycle management

use crate::api::rest::{create_router, AppState};
use crate::config::OperatorConfig;
use crate::controller::Controller;
use crate::error::{DaemonError, DaemonResult};
use crate::reconciler::Reconciler;
use crate::store::{EventStore, InMemoryStore};
use infoscreen_types::OperatorEventEnvelope;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};

/// Operator daemon: controller loop plus REST API over one store
pub struct Server {
    config: OperatorConfig,
    store: Arc<InMemoryStore>,
    controller: Arc<Controller>,
    event_tx: broadcast::Sender<OperatorEventEnvelope>,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: OperatorConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let (event_tx, _) = broadcast::channel(1000);

        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            config.workload.clone(),
            config.reconciler.clone(),
            event_tx.clone(),
        ));
        let controller = Controller::new(
            reconciler,
            store.clone(),
            config.controller.clone(),
            event_tx.clone(),
        );

        Self {
            config,
            store,
            controller,
            event_tx,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let listener = TcpListener::bind(addr).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Persist operator events for the API
        let event_store = self.store.clone();
        let mut event_rx = self.event_tx.subscribe();
        let recorder = tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        if let Err(e) = event_store.store_event(event).await {
                            tracing::warn!(error = %e, "Failed to record event");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Event recorder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let controller = tokio::spawn(
            self.controller
                .clone()
                .run(self.store.subscribe(), shutdown_rx),
        );

        let state = AppState::new(self.store.clone(), self.controller.clone());
        let app = create_router(state, self.config.server.enable_cors);

        tracing::info!(%addr, "infoscreen operator listening");

        // Dropping the sender also stops the controller if serving fails
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = shutdown_tx.send(true);
            })
            .await;

        tracing::info!("infoscreen operator shutting down");

        if let Err(e) = controller.await {
            tracing::error!(error = %e, "Controller task failed");
        }
        recorder.abort();

        result.map_err(|e| DaemonError::Server(e.to_string()))
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
