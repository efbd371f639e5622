//! Observed state of a session
//!
//! The status is written only by the operator. Conditions form an append-only
//! transition log: the operator never reorders or truncates them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason recorded when a spec change starts a new provisioning round
pub const REASON_CHANGED: &str = "Changed";

/// Coarse lifecycle stage of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Child objects are being created
    Provisioning,
    /// The workload reports healthy
    Ready,
    /// The workload exists but is not healthy
    NotReady,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Provisioning => "Provisioning",
            SessionPhase::Ready => "Ready",
            SessionPhase::NotReady => "NotReady",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Truth value of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// One entry of the status transition log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: ConditionStatus,
    #[serde(default)]
    pub observed_generation: i64,
    pub last_transition_time: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
}

/// Status sub-record of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<SessionPhase>,

    #[serde(default)]
    pub observed_generation: i64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl SessionStatus {
    /// Most recently appended condition
    pub fn last_condition(&self) -> Option<&Condition> {
        self.conditions.last()
    }

    /// Record that provisioning of `generation` has started.
    ///
    /// A condition is appended only when this is a transition, i.e. the phase
    /// or the generation differs from the last recorded entry. Returns whether
    /// the status changed.
    pub fn mark_provisioning(
        &mut self,
        generation: i64,
        message: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        let phase = SessionPhase::Provisioning;
        let already_recorded = self.phase == Some(phase)
            && self.last_condition().is_some_and(|c| {
                c.condition_type == phase.as_str()
                    && c.status == ConditionStatus::True
                    && c.observed_generation == generation
            });

        let mut changed = self.observed_generation != generation || self.phase != Some(phase);
        self.observed_generation = generation;
        self.phase = Some(phase);

        if !already_recorded {
            self.conditions.push(Condition {
                condition_type: phase.as_str().to_string(),
                status: ConditionStatus::True,
                observed_generation: generation,
                last_transition_time: now,
                reason: REASON_CHANGED.to_string(),
                message: message.to_string(),
            });
            changed = true;
        }

        changed
    }
}
