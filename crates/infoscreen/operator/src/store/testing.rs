//! Store double for tests: records every call and fails chosen ones

use super::{ExposureStore, InMemoryStore, SessionStore, WorkloadStore};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use infoscreen_types::{NetworkExposure, ObjectKey, Session, SessionStatus, WorkloadUnit};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Store double that records every call and can fail chosen ones
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub(crate) inner: InMemoryStore,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, StoreError>>,
    /// Inserted right before `create_workload` runs, simulating a racing writer
    racing_workload: Mutex<Option<WorkloadUnit>>,
    /// Added to every `get_session` call
    get_delay: Mutex<Option<Duration>>,
    /// Delete the session right after the next successful status write
    delete_after_status: Mutex<bool>,
}

impl RecordingStore {
    fn record(&self, call: &'static str) -> StoreResult<()> {
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub(crate) fn fail(&self, call: &'static str, err: StoreError) {
        self.failures.lock().unwrap().insert(call, err);
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub(crate) fn creates(&self) -> usize {
        self.count("create_workload") + self.count("create_exposure")
    }

    pub(crate) fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub(crate) fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Have `workload` appear just before the next `create_workload`
    pub(crate) fn race_workload(&self, workload: WorkloadUnit) {
        *self.racing_workload.lock().unwrap() = Some(workload);
    }

    pub(crate) fn delay_gets(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = Some(delay);
    }

    /// Simulate a user deleting the session while a pass is in flight
    pub(crate) fn delete_after_status_write(&self) {
        *self.delete_after_status.lock().unwrap() = true;
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn get_session(&self, key: &ObjectKey) -> StoreResult<Option<Session>> {
        self.record("get_session")?;
        let delay = *self.get_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.get_session(key).await
    }

    async fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        self.record("list_sessions")?;
        self.inner.list_sessions().await
    }

    async fn create_session(&self, session: Session) -> StoreResult<Session> {
        self.inner.create_session(session).await
    }

    async fn apply_session(&self, session: Session) -> StoreResult<Session> {
        self.inner.apply_session(session).await
    }

    async fn delete_session(&self, key: &ObjectKey) -> StoreResult<bool> {
        self.inner.delete_session(key).await
    }

    async fn update_session_status(
        &self,
        key: &ObjectKey,
        status: SessionStatus,
    ) -> StoreResult<Session> {
        self.record("update_session_status")?;
        let updated = self.inner.update_session_status(key, status).await?;
        let delete = std::mem::take(&mut *self.delete_after_status.lock().unwrap());
        if delete {
            self.inner.delete_session(key).await?;
        }
        Ok(updated)
    }
}

#[async_trait]
impl WorkloadStore for RecordingStore {
    async fn get_workload(&self, key: &ObjectKey) -> StoreResult<Option<WorkloadUnit>> {
        self.record("get_workload")?;
        self.inner.get_workload(key).await
    }

    async fn list_workloads(&self) -> StoreResult<Vec<WorkloadUnit>> {
        self.inner.list_workloads().await
    }

    async fn create_workload(&self, workload: WorkloadUnit) -> StoreResult<WorkloadUnit> {
        self.record("create_workload")?;
        let racing = self.racing_workload.lock().unwrap().take();
        if let Some(racing) = racing {
            self.inner.create_workload(racing).await?;
        }
        self.inner.create_workload(workload).await
    }

    async fn replace_workload(&self, workload: WorkloadUnit) -> StoreResult<WorkloadUnit> {
        self.record("replace_workload")?;
        self.inner.replace_workload(workload).await
    }
}

#[async_trait]
impl ExposureStore for RecordingStore {
    async fn get_exposure(&self, key: &ObjectKey) -> StoreResult<Option<NetworkExposure>> {
        self.record("get_exposure")?;
        self.inner.get_exposure(key).await
    }

    async fn list_exposures(&self) -> StoreResult<Vec<NetworkExposure>> {
        self.inner.list_exposures().await
    }

    async fn create_exposure(&self, exposure: NetworkExposure) -> StoreResult<NetworkExposure> {
        self.record("create_exposure")?;
        self.inner.create_exposure(exposure).await
    }

    async fn replace_exposure(&self, exposure: NetworkExposure) -> StoreResult<NetworkExposure> {
        self.record("replace_exposure")?;
        self.inner.replace_exposure(exposure).await
    }
}
