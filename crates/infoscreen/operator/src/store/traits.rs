//! Store capability traits
//!
//! The reconciler only ever sees these traits. Every call is keyed by object
//! identity; whether a call is idempotent is up to the implementation.

use crate::error::StoreResult;
use async_trait::async_trait;
use infoscreen_types::{
    NetworkExposure, ObjectKey, OperatorEventEnvelope, Session, SessionStatus, WorkloadUnit,
};

/// Everything the reconciler needs from a store
pub trait ResourceStore: SessionStore + WorkloadStore + ExposureStore + Send + Sync {}

impl<T> ResourceStore for T where T: SessionStore + WorkloadStore + ExposureStore + Send + Sync {}

/// Full store surface used by the daemon
pub trait Storage: ResourceStore + EventStore {}

impl<T> Storage for T where T: ResourceStore + EventStore {}

/// Storage for session resources
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Get a session by key
    async fn get_session(&self, key: &ObjectKey) -> StoreResult<Option<Session>>;

    /// List all sessions
    async fn list_sessions(&self) -> StoreResult<Vec<Session>>;

    /// Create a session, failing with `AlreadyExists` if the key is taken.
    ///
    /// Identity and status are assigned as for a first `apply_session`.
    async fn create_session(&self, session: Session) -> StoreResult<Session>;

    /// Create a session or update its spec and labels.
    ///
    /// The store assigns uid and generation; a spec change bumps the
    /// generation. Any status carried by `session` is ignored.
    async fn apply_session(&self, session: Session) -> StoreResult<Session>;

    /// Delete a session and every object it owns
    async fn delete_session(&self, key: &ObjectKey) -> StoreResult<bool>;

    /// Replace the status sub-record, leaving spec and metadata alone
    async fn update_session_status(
        &self,
        key: &ObjectKey,
        status: SessionStatus,
    ) -> StoreResult<Session>;
}

/// Storage for workload units
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Get a workload by key
    async fn get_workload(&self, key: &ObjectKey) -> StoreResult<Option<WorkloadUnit>>;

    /// List all workloads
    async fn list_workloads(&self) -> StoreResult<Vec<WorkloadUnit>>;

    /// Create a workload; fails with `AlreadyExists` if the key is taken
    async fn create_workload(&self, workload: WorkloadUnit) -> StoreResult<WorkloadUnit>;

    /// Replace an existing workload's labels, owners and spec
    async fn replace_workload(&self, workload: WorkloadUnit) -> StoreResult<WorkloadUnit>;
}

/// Storage for network exposures
#[async_trait]
pub trait ExposureStore: Send + Sync {
    /// Get an exposure by key
    async fn get_exposure(&self, key: &ObjectKey) -> StoreResult<Option<NetworkExposure>>;

    /// List all exposures
    async fn list_exposures(&self) -> StoreResult<Vec<NetworkExposure>>;

    /// Create an exposure; fails with `AlreadyExists` if the key is taken
    async fn create_exposure(&self, exposure: NetworkExposure) -> StoreResult<NetworkExposure>;

    /// Replace an existing exposure's labels, owners and spec
    async fn replace_exposure(&self, exposure: NetworkExposure) -> StoreResult<NetworkExposure>;
}

/// Storage for operator events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Store an event
    async fn store_event(&self, event: OperatorEventEnvelope) -> StoreResult<()>;

    /// Get recent events, newest last
    async fn get_recent_events(&self, limit: usize) -> StoreResult<Vec<OperatorEventEnvelope>>;

    /// Get recent events for one session, newest last
    async fn get_events_for_session(
        &self,
        key: &ObjectKey,
        limit: usize,
    ) -> StoreResult<Vec<OperatorEventEnvelope>>;
}
