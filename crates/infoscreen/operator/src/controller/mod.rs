//! Controller loop
//!
//! Turns store change notifications and periodic resyncs into reconciliation
//! passes. Passes for distinct sessions run in parallel up to a configured
//! limit; passes for the same session never overlap. Failed passes are
//! retried with exponential backoff.

mod queue;

pub use queue::WorkQueue;

use crate::config::ControllerConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::reconciler::{Action, Reconciler};
use crate::store::{ResourceStore, WatchEvent};
use infoscreen_types::{ObjectKey, OperatorEvent, OperatorEventEnvelope};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex, Semaphore};
use tokio::time::{interval, MissedTickBehavior};

/// Drives the reconciler for every session in the store
pub struct Controller {
    reconciler: Arc<Reconciler>,
    store: Arc<dyn ResourceStore>,
    config: ControllerConfig,
    queue: Arc<WorkQueue>,
    failures: Mutex<HashMap<ObjectKey, u32>>,
    event_tx: broadcast::Sender<OperatorEventEnvelope>,
}

impl Controller {
    /// Create a new controller
    pub fn new(
        reconciler: Arc<Reconciler>,
        store: Arc<dyn ResourceStore>,
        config: ControllerConfig,
        event_tx: broadcast::Sender<OperatorEventEnvelope>,
    ) -> Arc<Self> {
        Arc::new(Self {
            reconciler,
            store,
            config,
            queue: Arc::new(WorkQueue::new()),
            failures: Mutex::new(HashMap::new()),
            event_tx,
        })
    }

    /// Sessions waiting for a pass
    pub async fn pending(&self) -> usize {
        self.queue.len().await
    }

    /// Run until `shutdown` flips to `true`.
    pub async fn run(
        self: Arc<Self>,
        mut changes: broadcast::Receiver<WatchEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(
            resync_secs = self.config.resync_interval_secs,
            max_concurrent = self.config.max_concurrent_reconciliations,
            "Controller started"
        );

        // Watch and resync feed the queue
        let feeder = self.clone();
        let feed_handle = tokio::spawn(async move {
            let mut resync = interval(feeder.config.resync_interval());
            resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut watching = true;

            loop {
                tokio::select! {
                    _ = resync.tick() => feeder.resync().await,
                    change = changes.recv(), if watching => match change {
                        Ok(event) => {
                            tracing::debug!(session = %event.key(), ?event, "Session changed");
                            feeder.queue.add(event.key().clone()).await;
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "Change stream lagged, resyncing");
                            feeder.resync().await;
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::warn!("Change stream closed, relying on resync");
                            watching = false;
                        }
                    },
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            feeder.queue.shutdown().await;
        });

        // Workers
        let limit = self.config.max_concurrent_reconciliations.max(1);
        let permits = Arc::new(Semaphore::new(limit));
        while let Some(key) = self.queue.next().await {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let worker = self.clone();
            tokio::spawn(async move {
                worker.process(key).await;
                drop(permit);
            });
        }

        let _ = feed_handle.await;
        // Let in-flight passes finish
        let _ = permits.acquire_many(limit as u32).await;
        tracing::info!("Controller stopped");
    }

    /// Queue every known session
    async fn resync(&self) {
        match self.store.list_sessions().await {
            Ok(sessions) => {
                tracing::debug!(count = sessions.len(), "Resyncing sessions");
                for session in sessions {
                    self.queue.add(session.key()).await;
                }
            }
            Err(e) => tracing::error!(error = %e, "Resync failed to list sessions"),
        }
    }

    /// Run one pass for `key` under the configured deadline and schedule
    /// whatever comes next
    async fn process(&self, key: ObjectKey) {
        let result = self.reconcile_with_deadline(&key).await;

        let next = match result {
            Ok(action) => {
                self.failures.lock().await.remove(&key);
                action
            }
            Err(e) => {
                let action = self.error_policy(&key, &e).await;
                tracing::error!(
                    session = %key,
                    error = %e,
                    retry_in = ?action.requeue_after(),
                    "Reconciliation failed"
                );
                let _ = self.event_tx.send(OperatorEventEnvelope::new(
                    key.clone(),
                    OperatorEvent::ReconcileFailed {
                        reason: e.to_string(),
                    },
                ));
                action
            }
        };

        if let Some(delay) = next.requeue_after() {
            self.queue.add_after(key.clone(), delay);
        }
        self.queue.done(&key).await;
    }

    async fn reconcile_with_deadline(&self, key: &ObjectKey) -> ReconcileResult<Action> {
        let deadline = self.config.reconcile_timeout();
        match tokio::time::timeout(deadline, self.reconciler.reconcile(key)).await {
            Ok(result) => result,
            Err(_) => Err(ReconcileError::DeadlineExceeded(deadline)),
        }
    }

    /// Every failure is retried; consecutive failures back off exponentially
    async fn error_policy(&self, key: &ObjectKey, _error: &ReconcileError) -> Action {
        let mut failures = self.failures.lock().await;
        let count = failures.entry(key.clone()).or_insert(0);
        *count = count.saturating_add(1);
        Action::requeue(self.config.backoff(*count))
    }
}
