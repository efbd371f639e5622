//! Infoscreen Types - Session resources and the runtime object model
//!
//! An infoscreen session is a browser opened on a URL inside a sandboxed
//! workload and exposed over VNC. Users declare sessions; the operator turns
//! each one into concrete runtime objects and reports progress back through
//! the session status.
//!
//! ## Key Concepts
//!
//! - **Session**: user-declared intent (`spec`) plus operator-owned `status`
//! - **WorkloadUnit**: the single compute unit running the browser
//! - **NetworkExposure**: a ported reachability record selecting a workload
//! - **OwnerReference**: plain-data link from a child object to its session
//! - **OperatorEvent**: unified observability stream

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod events;
pub mod exposure;
pub mod ids;
pub mod meta;
pub mod session;
pub mod status;
pub mod workload;

// Re-export main types
pub use events::{ChildKind, EventSeverity, OperatorEvent, OperatorEventEnvelope};
pub use exposure::{ExposureSpec, ExposureType, NetworkExposure, PortTarget, ServicePort};
pub use ids::{KeyParseError, ObjectKey, ObjectUid};
pub use meta::{Labels, ObjectMeta, OwnerReference};
pub use session::{
    ClusterRef, CredentialsSpec, Resolution, SecretReference, Session, SessionSpec, API_GROUP,
    API_VERSION, SESSION_KIND,
};
pub use status::{Condition, ConditionStatus, SessionPhase, SessionStatus};
pub use workload::{
    Container, ContainerPort, EnvValue, EnvVar, PullPolicy, RestartPolicy, StorageMedium, Volume,
    VolumeMount, VolumeSource, WorkloadSpec, WorkloadUnit,
};
