//! Uniform access to the child object kinds a session owns

use crate::error::StoreResult;
use crate::store::ResourceStore;
use async_trait::async_trait;
use infoscreen_types::{ChildKind, NetworkExposure, ObjectKey, ObjectMeta, WorkloadUnit};

/// A synthesized object kind and the store calls that manage it
#[async_trait]
pub(crate) trait ChildObject: Sized + Clone + Send + Sync + 'static {
    const KIND: ChildKind;

    fn meta(&self) -> &ObjectMeta;

    /// Spec equality, ignoring metadata
    fn same_spec(&self, other: &Self) -> bool;

    async fn fetch(store: &dyn ResourceStore, key: &ObjectKey) -> StoreResult<Option<Self>>;

    async fn create(self, store: &dyn ResourceStore) -> StoreResult<Self>;

    async fn replace(self, store: &dyn ResourceStore) -> StoreResult<Self>;

    /// Whether a stored object already carries everything `desired` asks
    /// for. Store-assigned fields (uid, generation, timestamps) are ignored.
    fn matches(&self, desired: &Self) -> bool {
        let (stored, wanted) = (self.meta(), desired.meta());
        stored.labels == wanted.labels
            && stored.owner_references == wanted.owner_references
            && self.same_spec(desired)
    }
}

#[async_trait]
impl ChildObject for WorkloadUnit {
    const KIND: ChildKind = ChildKind::WorkloadUnit;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn same_spec(&self, other: &Self) -> bool {
        self.spec == other.spec
    }

    async fn fetch(store: &dyn ResourceStore, key: &ObjectKey) -> StoreResult<Option<Self>> {
        store.get_workload(key).await
    }

    async fn create(self, store: &dyn ResourceStore) -> StoreResult<Self> {
        store.create_workload(self).await
    }

    async fn replace(self, store: &dyn ResourceStore) -> StoreResult<Self> {
        store.replace_workload(self).await
    }
}

#[async_trait]
impl ChildObject for NetworkExposure {
    const KIND: ChildKind = ChildKind::NetworkExposure;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn same_spec(&self, other: &Self) -> bool {
        self.spec == other.spec
    }

    async fn fetch(store: &dyn ResourceStore, key: &ObjectKey) -> StoreResult<Option<Self>> {
        store.get_exposure(key).await
    }

    async fn create(self, store: &dyn ResourceStore) -> StoreResult<Self> {
        store.create_exposure(self).await
    }

    async fn replace(self, store: &dyn ResourceStore) -> StoreResult<Self> {
        store.replace_exposure(self).await
    }
}
