//! Per-incident outcomes and the per-cycle summary built from them.

use std::fmt;

use crate::types::{MessageId, RoleId, ThreadId};

/// The step of the new or update path at which an incident was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Lookup,
    CreateMessage,
    GetChannelType,
    CreateRole,
    CreateThread,
    EditMessage,
    PostUpdate,
    Persist,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Lookup => "lookup",
            Step::CreateMessage => "create_message",
            Step::GetChannelType => "get_channel_type",
            Step::CreateRole => "create_role",
            Step::CreateThread => "create_thread",
            Step::EditMessage => "edit_message",
            Step::PostUpdate => "post_update",
            Step::Persist => "persist",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentOutcome {
    /// First sighting: message, role and thread created and recorded.
    Created {
        message_id: MessageId,
        role_id: RoleId,
        thread_id: ThreadId,
    },

    /// A newer update was mirrored. `terminal` means cleanup was attempted.
    Updated { terminal: bool },

    Unchanged,

    /// Abandoned for this cycle; the next cycle starts over.
    Skipped { step: Step, error: String },
}

/// Counts of what one reconcile cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    /// Subset of `updated` whose incident reached a terminal status.
    pub resolved: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl CycleReport {
    pub fn new(fetched: usize) -> Self {
        CycleReport {
            fetched,
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &IncidentOutcome) {
        match outcome {
            IncidentOutcome::Created { .. } => self.created += 1,
            IncidentOutcome::Updated { terminal } => {
                self.updated += 1;
                if *terminal {
                    self.resolved += 1;
                }
            }
            IncidentOutcome::Unchanged => self.unchanged += 1,
            IncidentOutcome::Skipped { .. } => self.skipped += 1,
        }
    }

    /// True when some incident had work done to it.
    pub fn changed_anything(&self) -> bool {
        self.created + self.updated > 0
    }
}
