//! In-memory store implementation

use super::traits::*;
use super::WatchEvent;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use infoscreen_types::{
    NetworkExposure, ObjectKey, ObjectMeta, ObjectUid, OperatorEventEnvelope, Session,
    SessionStatus, WorkloadUnit, API_VERSION, SESSION_KIND,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Events kept for the API before the oldest are dropped
const MAX_EVENTS: usize = 1000;

/// In-memory store for development and testing.
///
/// Mirrors the orchestrator behaviors the operator relies on: uid and
/// generation bookkeeping, cascading deletion through owner references and
/// change notifications for session specs.
#[derive(Debug)]
pub struct InMemoryStore {
    sessions: Arc<RwLock<BTreeMap<ObjectKey, Session>>>,
    workloads: Arc<RwLock<BTreeMap<ObjectKey, WorkloadUnit>>>,
    exposures: Arc<RwLock<BTreeMap<ObjectKey, NetworkExposure>>>,
    events: Arc<RwLock<VecDeque<OperatorEventEnvelope>>>,
    watch_tx: broadcast::Sender<WatchEvent>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        let (watch_tx, _) = broadcast::channel(1024);
        Self {
            sessions: Arc::new(RwLock::new(BTreeMap::new())),
            workloads: Arc::new(RwLock::new(BTreeMap::new())),
            exposures: Arc::new(RwLock::new(BTreeMap::new())),
            events: Arc::new(RwLock::new(VecDeque::new())),
            watch_tx,
        }
    }

    /// Subscribe to session change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<WatchEvent> {
        self.watch_tx.subscribe()
    }

    fn notify(&self, event: WatchEvent) {
        // No subscribers is fine; the controller resyncs anyway.
        let _ = self.watch_tx.send(event);
    }
}

fn stamp_new(meta: &mut ObjectMeta) {
    meta.uid = ObjectUid::generate();
    meta.generation = 1;
    meta.creation_timestamp = Some(chrono::Utc::now());
}

/// Store-owned fields of a session that enters the store
fn admit_new(session: &mut Session) {
    stamp_new(&mut session.metadata);
    session.metadata.owner_references.clear();
    session.status = SessionStatus::default();
}

/// A child controlled by a session may only be written while that exact
/// session (same uid) exists. Callers hold the sessions lock across the
/// check and the write so a concurrent delete cascades over the result.
fn ensure_live_controller(
    sessions: &BTreeMap<ObjectKey, Session>,
    meta: &ObjectMeta,
) -> StoreResult<()> {
    let Some(owner) = meta.controller_ref() else {
        return Ok(());
    };
    if owner.kind != SESSION_KIND || owner.api_version != API_VERSION {
        return Ok(());
    }

    let owner_key = ObjectKey::new(meta.namespace.clone(), owner.name.clone());
    match sessions.get(&owner_key) {
        Some(session) if session.metadata.uid == owner.uid => Ok(()),
        _ => Err(StoreError::NotFound(format!(
            "owner session {} ({})",
            owner_key, owner.uid
        ))),
    }
}

/// Carry store-owned fields over from the stored copy
fn carry_identity(meta: &mut ObjectMeta, stored: &ObjectMeta) {
    meta.uid = stored.uid.clone();
    meta.generation = stored.generation + 1;
    meta.creation_timestamp = stored.creation_timestamp;
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get_session(&self, key: &ObjectKey) -> StoreResult<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(key).cloned())
    }

    async fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.values().cloned().collect())
    }

    async fn create_session(&self, mut session: Session) -> StoreResult<Session> {
        let key = session.key();
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!("session {}", key)));
        }
        admit_new(&mut session);
        sessions.insert(key.clone(), session.clone());
        drop(sessions);

        tracing::debug!(session = %key, uid = %session.metadata.uid, "Session created");
        self.notify(WatchEvent::Applied(key));

        Ok(session)
    }

    async fn apply_session(&self, mut session: Session) -> StoreResult<Session> {
        let key = session.key();
        let mut sessions = self.sessions.write().await;

        let (stored, changed) = match sessions.get_mut(&key) {
            Some(existing) => {
                if !session.metadata.uid.is_empty() && session.metadata.uid != existing.metadata.uid
                {
                    return Err(StoreError::Conflict(format!(
                        "session {} has uid {}, not {}",
                        key, existing.metadata.uid, session.metadata.uid
                    )));
                }

                let spec_changed = existing.spec != session.spec;
                let labels_changed = existing.metadata.labels != session.metadata.labels;
                if spec_changed {
                    existing.spec = session.spec;
                    existing.metadata.generation += 1;
                }
                if labels_changed {
                    existing.metadata.labels = session.metadata.labels;
                }
                (existing.clone(), spec_changed || labels_changed)
            }
            None => {
                admit_new(&mut session);
                sessions.insert(key.clone(), session.clone());
                (session, true)
            }
        };
        drop(sessions);

        if changed {
            tracing::debug!(session = %key, generation = stored.metadata.generation, "Session applied");
            self.notify(WatchEvent::Applied(key));
        }

        Ok(stored)
    }

    async fn delete_session(&self, key: &ObjectKey) -> StoreResult<bool> {
        let removed = self.sessions.write().await.remove(key);
        let Some(session) = removed else {
            return Ok(false);
        };

        let uid = &session.metadata.uid;
        self.workloads
            .write()
            .await
            .retain(|_, w| !w.metadata.is_owned_by(uid));
        self.exposures
            .write()
            .await
            .retain(|_, e| !e.metadata.is_owned_by(uid));

        tracing::debug!(session = %key, "Session deleted with dependents");
        self.notify(WatchEvent::Deleted(key.clone()));

        Ok(true)
    }

    async fn update_session_status(
        &self,
        key: &ObjectKey,
        status: SessionStatus,
    ) -> StoreResult<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("session {}", key)))?;
        session.status = status;
        Ok(session.clone())
    }
}

#[async_trait]
impl WorkloadStore for InMemoryStore {
    async fn get_workload(&self, key: &ObjectKey) -> StoreResult<Option<WorkloadUnit>> {
        let workloads = self.workloads.read().await;
        Ok(workloads.get(key).cloned())
    }

    async fn list_workloads(&self) -> StoreResult<Vec<WorkloadUnit>> {
        let workloads = self.workloads.read().await;
        Ok(workloads.values().cloned().collect())
    }

    async fn create_workload(&self, mut workload: WorkloadUnit) -> StoreResult<WorkloadUnit> {
        let key = workload.metadata.key();
        let sessions = self.sessions.read().await;
        ensure_live_controller(&sessions, &workload.metadata)?;
        let mut workloads = self.workloads.write().await;
        if workloads.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!("workload {}", key)));
        }
        stamp_new(&mut workload.metadata);
        workloads.insert(key, workload.clone());
        Ok(workload)
    }

    async fn replace_workload(&self, mut workload: WorkloadUnit) -> StoreResult<WorkloadUnit> {
        let key = workload.metadata.key();
        let sessions = self.sessions.read().await;
        ensure_live_controller(&sessions, &workload.metadata)?;
        let mut workloads = self.workloads.write().await;
        let stored = workloads
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(format!("workload {}", key)))?;
        carry_identity(&mut workload.metadata, &stored.metadata);
        *stored = workload.clone();
        Ok(workload)
    }
}

#[async_trait]
impl ExposureStore for InMemoryStore {
    async fn get_exposure(&self, key: &ObjectKey) -> StoreResult<Option<NetworkExposure>> {
        let exposures = self.exposures.read().await;
        Ok(exposures.get(key).cloned())
    }

    async fn list_exposures(&self) -> StoreResult<Vec<NetworkExposure>> {
        let exposures = self.exposures.read().await;
        Ok(exposures.values().cloned().collect())
    }

    async fn create_exposure(&self, mut exposure: NetworkExposure) -> StoreResult<NetworkExposure> {
        let key = exposure.metadata.key();
        let sessions = self.sessions.read().await;
        ensure_live_controller(&sessions, &exposure.metadata)?;
        let mut exposures = self.exposures.write().await;
        if exposures.contains_key(&key) {
            return Err(StoreError::AlreadyExists(format!("exposure {}", key)));
        }
        stamp_new(&mut exposure.metadata);
        exposures.insert(key, exposure.clone());
        Ok(exposure)
    }

    async fn replace_exposure(&self, mut exposure: NetworkExposure) -> StoreResult<NetworkExposure> {
        let key = exposure.metadata.key();
        let sessions = self.sessions.read().await;
        ensure_live_controller(&sessions, &exposure.metadata)?;
        let mut exposures = self.exposures.write().await;
        let stored = exposures
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(format!("exposure {}", key)))?;
        carry_identity(&mut exposure.metadata, &stored.metadata);
        *stored = exposure.clone();
        Ok(exposure)
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn store_event(&self, event: OperatorEventEnvelope) -> StoreResult<()> {
        let mut events = self.events.write().await;
        if events.len() == MAX_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }

    async fn get_recent_events(&self, limit: usize) -> StoreResult<Vec<OperatorEventEnvelope>> {
        let events = self.events.read().await;
        let skip = events.len().saturating_sub(limit);
        Ok(events.iter().skip(skip).cloned().collect())
    }

    async fn get_events_for_session(
        &self,
        key: &ObjectKey,
        limit: usize,
    ) -> StoreResult<Vec<OperatorEventEnvelope>> {
        let events = self.events.read().await;
        let mut matching: Vec<_> = events
            .iter()
            .rev()
            .filter(|e| &e.session == key)
            .take(limit)
            .cloned()
            .collect();
        matching.reverse();
        Ok(matching)
    }
}
