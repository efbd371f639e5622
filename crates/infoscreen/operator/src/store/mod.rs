//! Resource store for infoscreen-operator
//!
//! The traits describe the capabilities the reconciler consumes. The
//! in-memory implementation backs the daemon and the tests.

mod memory;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use memory::InMemoryStore;
pub use traits::{
    EventStore, ExposureStore, ResourceStore, SessionStore, Storage, WorkloadStore,
};

use infoscreen_types::ObjectKey;

/// Change notification for a session's desired state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Created, or spec/labels changed
    Applied(ObjectKey),
    /// Removed, together with its children
    Deleted(ObjectKey),
}

impl WatchEvent {
    pub fn key(&self) -> &ObjectKey {
        match self {
            WatchEvent::Applied(key) | WatchEvent::Deleted(key) => key,
        }
    }
}
