//! Reconciliation engine
//!
//! One call to [`Reconciler::reconcile`] is one pass for one session: fetch
//! the session, record that provisioning started, synthesize the children and
//! make sure each of them exists in its synthesized form. The engine keeps no
//! state between passes, so passes for different sessions may run in
//! parallel. Passes for the same session must be serialized by the caller.

mod child;

use crate::config::{ReconcilerConfig, WorkloadTemplate};
use crate::error::{ReconcileError, ReconcileResult, StoreError};
use crate::store::ResourceStore;
use crate::synth::{synthesize, SynthesizedObjects};
use child::ChildObject;
use infoscreen_types::{ObjectKey, ObjectUid, OperatorEvent, OperatorEventEnvelope, Session};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Message of the condition appended when provisioning starts
pub const PROVISIONING_MESSAGE: &str = "Creating child resources";

/// What the caller should do after a successful pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    requeue_after: Option<Duration>,
}

impl Action {
    /// Run again after `duration`
    pub fn requeue(duration: Duration) -> Self {
        Self {
            requeue_after: Some(duration),
        }
    }

    /// Run again only on the next change or resync
    pub fn await_change() -> Self {
        Self {
            requeue_after: None,
        }
    }

    pub fn requeue_after(&self) -> Option<Duration> {
        self.requeue_after
    }
}

/// Result of ensuring one child object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    Replaced,
    Unchanged,
}

enum Plan {
    Create,
    Replace,
    Keep,
}

/// Reconciliation engine for session resources
pub struct Reconciler {
    store: Arc<dyn ResourceStore>,
    template: WorkloadTemplate,
    config: ReconcilerConfig,
    event_tx: broadcast::Sender<OperatorEventEnvelope>,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ResourceStore>,
        template: WorkloadTemplate,
        config: ReconcilerConfig,
        event_tx: broadcast::Sender<OperatorEventEnvelope>,
    ) -> Self {
        Self {
            store,
            template,
            config,
            event_tx,
        }
    }

    /// Run one reconciliation pass for the session at `key`.
    ///
    /// A session that no longer exists ends the pass cleanly. Any other
    /// failure aborts the pass at the step that failed; nothing already
    /// written is rolled back.
    pub async fn reconcile(&self, key: &ObjectKey) -> ReconcileResult<Action> {
        let Some(mut session) = self.store.get_session(key).await? else {
            tracing::debug!(session = %key, "Session not found, nothing to do");
            return Ok(Action::await_change());
        };

        let generation = session.metadata.generation;
        let status_changed = session.status.mark_provisioning(
            generation,
            PROVISIONING_MESSAGE,
            chrono::Utc::now(),
        );

        if status_changed {
            tracing::info!(session = %key, generation, "Provisioning session");
            self.emit(key, OperatorEvent::ProvisioningStarted { generation });

            if self.config.publish_status {
                match self
                    .store
                    .update_session_status(key, session.status.clone())
                    .await
                {
                    Ok(_) => {}
                    Err(StoreError::NotFound(_)) => {
                        tracing::debug!(session = %key, "Session deleted during pass");
                        return Ok(Action::await_change());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        let objects = synthesize(&session, &self.template);
        let outcomes = match self.ensure_children(&session, objects).await {
            Ok(outcomes) => outcomes,
            Err(ReconcileError::Store(StoreError::NotFound(reason))) => {
                if self.is_current(&session).await? {
                    return Err(StoreError::NotFound(reason).into());
                }
                tracing::debug!(session = %key, %reason, "Session deleted during pass");
                return Ok(Action::await_change());
            }
            Err(e) => return Err(e),
        };

        if status_changed || outcomes.iter().any(|o| *o != EnsureOutcome::Unchanged) {
            tracing::info!(session = %key, generation, "Session children in place");
            self.emit(key, OperatorEvent::ReconcileSucceeded { generation });
        } else {
            tracing::debug!(session = %key, generation, "Session up to date");
        }

        Ok(Action::await_change())
    }

    /// Ensure the workload, then the external and internal exposures,
    /// stopping at the first failure
    async fn ensure_children(
        &self,
        session: &Session,
        objects: SynthesizedObjects,
    ) -> ReconcileResult<[EnsureOutcome; 3]> {
        Ok([
            self.ensure(session, objects.workload).await?,
            self.ensure(session, objects.external).await?,
            self.ensure(session, objects.internal).await?,
        ])
    }

    /// Whether the store still holds this incarnation of `session`
    async fn is_current(&self, session: &Session) -> ReconcileResult<bool> {
        let stored = self.store.get_session(&session.key()).await?;
        Ok(stored.is_some_and(|s| s.metadata.uid == session.metadata.uid))
    }

    /// Make sure `desired` exists in the store in its synthesized form
    async fn ensure<T: ChildObject>(
        &self,
        session: &Session,
        desired: T,
    ) -> ReconcileResult<EnsureOutcome> {
        let kind = T::KIND;
        let key = desired.meta().key();
        let owner = &session.metadata.uid;
        let store = self.store.as_ref();

        let existing = T::fetch(store, &key).await?;
        let outcome = match plan(existing.as_ref(), &desired, owner)? {
            Plan::Keep => EnsureOutcome::Unchanged,
            Plan::Replace => {
                desired.replace(store).await?;
                EnsureOutcome::Replaced
            }
            Plan::Create => match desired.clone().create(store).await {
                Ok(_) => EnsureOutcome::Created,
                Err(StoreError::AlreadyExists(reason)) => {
                    // Someone created it between our read and write; settle
                    // against what is there now.
                    let existing = T::fetch(store, &key).await?;
                    match plan(existing.as_ref(), &desired, owner)? {
                        Plan::Keep => EnsureOutcome::Unchanged,
                        Plan::Replace => {
                            desired.replace(store).await?;
                            EnsureOutcome::Replaced
                        }
                        Plan::Create => return Err(StoreError::AlreadyExists(reason).into()),
                    }
                }
                Err(e) => return Err(e.into()),
            },
        };

        match outcome {
            EnsureOutcome::Created => {
                tracing::info!(session = %session.key(), kind = %kind, child = %key, "Created child");
                self.emit(
                    &session.key(),
                    OperatorEvent::ChildCreated {
                        kind,
                        name: key.name,
                    },
                );
            }
            EnsureOutcome::Replaced => {
                tracing::warn!(session = %session.key(), kind = %kind, child = %key, "Replaced drifted child");
                self.emit(
                    &session.key(),
                    OperatorEvent::ChildReplaced {
                        kind,
                        name: key.name,
                    },
                );
            }
            EnsureOutcome::Unchanged => {
                tracing::trace!(session = %session.key(), kind = %kind, child = %key, "Child unchanged");
            }
        }

        Ok(outcome)
    }

    /// Emit an event
    fn emit(&self, session: &ObjectKey, event: OperatorEvent) {
        let _ = self
            .event_tx
            .send(OperatorEventEnvelope::new(session.clone(), event));
    }
}

/// Decide how to converge `existing` towards `desired`.
///
/// An object controlled by another owner is never touched. One without any
/// controller is adopted by replacing it.
fn plan<T: ChildObject>(
    existing: Option<&T>,
    desired: &T,
    owner: &ObjectUid,
) -> ReconcileResult<Plan> {
    let Some(existing) = existing else {
        return Ok(Plan::Create);
    };

    if let Some(controller) = existing.meta().controller_ref() {
        if &controller.uid != owner {
            return Err(ReconcileError::NotOwned {
                kind: T::KIND,
                key: existing.meta().key(),
                owner: Box::new(controller.clone()),
            });
        }
    }

    if existing.matches(desired) {
        Ok(Plan::Keep)
    } else {
        Ok(Plan::Replace)
    }
}
