//! Event types for operator observability
//!
//! Events provide a unified stream of reconciliation activity per session.

use crate::ObjectKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Envelope wrapping all operator events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEventEnvelope {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Event severity
    pub severity: EventSeverity,

    /// Session the event concerns
    pub session: ObjectKey,

    /// The actual event
    pub event: OperatorEvent,
}

impl OperatorEventEnvelope {
    pub fn new(session: ObjectKey, event: OperatorEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            severity: Self::infer_severity(&event),
            session,
            event,
        }
    }

    fn infer_severity(event: &OperatorEvent) -> EventSeverity {
        match event {
            OperatorEvent::ReconcileFailed { .. } => EventSeverity::Error,
            OperatorEvent::ChildReplaced { .. } => EventSeverity::Warning,
            _ => EventSeverity::Info,
        }
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// Kind of object synthesized for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChildKind {
    WorkloadUnit,
    NetworkExposure,
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildKind::WorkloadUnit => f.write_str("WorkloadUnit"),
            ChildKind::NetworkExposure => f.write_str("NetworkExposure"),
        }
    }
}

/// Operator events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorEvent {
    /// A pass recorded the start of provisioning for a generation
    ProvisioningStarted { generation: i64 },

    /// A child object was created
    ChildCreated { kind: ChildKind, name: String },

    /// A drifted child object was replaced with the synthesized one
    ChildReplaced { kind: ChildKind, name: String },

    /// All children are in place for a generation
    ReconcileSucceeded { generation: i64 },

    /// A pass ended with an error and will be retried
    ReconcileFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_inference() {
        let key = ObjectKey::new("ns", "s");
        let failed = OperatorEventEnvelope::new(
            key.clone(),
            OperatorEvent::ReconcileFailed {
                reason: "boom".to_string(),
            },
        );
        assert_eq!(failed.severity, EventSeverity::Error);

        let created = OperatorEventEnvelope::new(
            key,
            OperatorEvent::ChildCreated {
                kind: ChildKind::WorkloadUnit,
                name: "s".to_string(),
            },
        );
        assert_eq!(created.severity, EventSeverity::Info);
    }
}
