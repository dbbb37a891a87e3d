//! The durable mapping from an incident to the Discord artifacts created for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{IncidentId, MessageId, RoleId, ThreadId};
use super::incident::IncidentStatus;

/// The three Discord objects created when an incident is first announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifacts {
    pub role_id: RoleId,
    pub message_id: MessageId,
    pub thread_id: ThreadId,
}

/// What the store remembers about one incident.
///
/// Artifact ids are fixed at creation. The only mutation is [`observe`],
/// which records a newer status and never moves `updated_at` backwards.
///
/// [`observe`]: IncidentRecord::observe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    incident_id: IncidentId,
    #[serde(flatten)]
    artifacts: Artifacts,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    current_status: IncidentStatus,
}

impl IncidentRecord {
    pub fn new(
        incident_id: IncidentId,
        artifacts: Artifacts,
        status: IncidentStatus,
        now: DateTime<Utc>,
    ) -> Self {
        IncidentRecord {
            incident_id,
            artifacts,
            created_at: now,
            updated_at: now,
            current_status: status,
        }
    }

    pub fn incident_id(&self) -> &IncidentId {
        &self.incident_id
    }

    pub fn artifacts(&self) -> Artifacts {
        self.artifacts
    }

    pub fn role_id(&self) -> RoleId {
        self.artifacts.role_id
    }

    pub fn message_id(&self) -> MessageId {
        self.artifacts.message_id
    }

    pub fn thread_id(&self) -> ThreadId {
        self.artifacts.thread_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn current_status(&self) -> &IncidentStatus {
        &self.current_status
    }

    /// True when an update displayed at `display_at` has not been mirrored yet.
    pub fn is_behind(&self, display_at: DateTime<Utc>) -> bool {
        display_at > self.updated_at
    }

    /// Records that the incident was mirrored at `now` with `status`.
    pub fn observe(&mut self, status: IncidentStatus, now: DateTime<Utc>) {
        self.current_status = status;
        self.updated_at = self.updated_at.max(now);
    }
}
