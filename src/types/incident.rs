//! Incidents as reported by the status provider.
//!
//! Status strings are modelled as closed enums with an `Other` fallback so a
//! new provider value never fails deserialization of the whole incident list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::ids::IncidentId;

/// Lifecycle status of an incident or of one of its updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IncidentStatus {
    Investigating,
    Identified,
    Monitoring,
    Resolved,
    Postmortem,
    Scheduled,
    InProgress,
    Verifying,
    Completed,
    Other(String),
}

impl IncidentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            IncidentStatus::Investigating => "investigating",
            IncidentStatus::Identified => "identified",
            IncidentStatus::Monitoring => "monitoring",
            IncidentStatus::Resolved => "resolved",
            IncidentStatus::Postmortem => "postmortem",
            IncidentStatus::Scheduled => "scheduled",
            IncidentStatus::InProgress => "in_progress",
            IncidentStatus::Verifying => "verifying",
            IncidentStatus::Completed => "completed",
            IncidentStatus::Other(s) => s,
        }
    }

    /// Whether the incident has ended. Terminal incidents get their thread
    /// archived and their role deleted, and no longer offer the opt-in button.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IncidentStatus::Resolved | IncidentStatus::Completed)
    }
}

impl Default for IncidentStatus {
    fn default() -> Self {
        IncidentStatus::Other(String::new())
    }
}

impl From<String> for IncidentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "investigating" => IncidentStatus::Investigating,
            "identified" => IncidentStatus::Identified,
            "monitoring" => IncidentStatus::Monitoring,
            "resolved" => IncidentStatus::Resolved,
            "postmortem" => IncidentStatus::Postmortem,
            "scheduled" => IncidentStatus::Scheduled,
            "in_progress" => IncidentStatus::InProgress,
            "verifying" => IncidentStatus::Verifying,
            "completed" => IncidentStatus::Completed,
            _ => IncidentStatus::Other(s),
        }
    }
}

impl From<&str> for IncidentStatus {
    fn from(s: &str) -> Self {
        IncidentStatus::from(s.to_string())
    }
}

impl From<IncidentStatus> for String {
    fn from(status: IncidentStatus) -> Self {
        match status {
            IncidentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational status of a component affected by an incident.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentStatus {
    Operational,
    DegradedPerformance,
    PartialOutage,
    MajorOutage,
    UnderMaintenance,
    Other(String),
}

impl ComponentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ComponentStatus::Operational => "operational",
            ComponentStatus::DegradedPerformance => "degraded_performance",
            ComponentStatus::PartialOutage => "partial_outage",
            ComponentStatus::MajorOutage => "major_outage",
            ComponentStatus::UnderMaintenance => "under_maintenance",
            ComponentStatus::Other(s) => s,
        }
    }
}

impl Default for ComponentStatus {
    fn default() -> Self {
        ComponentStatus::Other(String::new())
    }
}

impl From<String> for ComponentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "operational" => ComponentStatus::Operational,
            "degraded_performance" => ComponentStatus::DegradedPerformance,
            "partial_outage" => ComponentStatus::PartialOutage,
            "major_outage" => ComponentStatus::MajorOutage,
            "under_maintenance" => ComponentStatus::UnderMaintenance,
            _ => ComponentStatus::Other(s),
        }
    }
}

impl From<ComponentStatus> for String {
    fn from(status: ComponentStatus) -> Self {
        match status {
            ComponentStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component listed on an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentComponent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ComponentStatus,
}

/// One timestamped update posted to an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    /// A missing or null timestamp decodes as the Unix epoch.
    #[serde(default = "unix_epoch", deserialize_with = "null_as_epoch")]
    pub display_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: IncidentStatus,
}

/// An incident exactly as the provider returns it: updates newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIncident {
    pub id: IncidentId,
    pub name: String,
    pub status: IncidentStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shortlink: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<IncidentComponent>,
    #[serde(
        rename = "incident_updates",
        default,
        deserialize_with = "null_as_default"
    )]
    pub updates: Vec<IncidentUpdate>,
}

impl RemoteIncident {
    /// Status of the first listed component, which drives severity and color.
    pub fn lead_component_status(&self) -> Option<&ComponentStatus> {
        self.components.first().map(|c| &c.status)
    }
}

/// An incident whose updates are held oldest first.
///
/// The provider lists updates newest first. Converting through
/// [`OrderedIncident::from_provider`] reverses them exactly once, so code that
/// renders a timeline or picks the latest update cannot get the order wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedIncident {
    incident: RemoteIncident,
}

impl OrderedIncident {
    pub fn from_provider(mut incident: RemoteIncident) -> Self {
        incident.updates.reverse();
        OrderedIncident { incident }
    }

    pub fn id(&self) -> &IncidentId {
        &self.incident.id
    }

    pub fn name(&self) -> &str {
        &self.incident.name
    }

    pub fn status(&self) -> &IncidentStatus {
        &self.incident.status
    }

    pub fn shortlink(&self) -> &str {
        &self.incident.shortlink
    }

    pub fn lead_component_status(&self) -> Option<&ComponentStatus> {
        self.incident.lead_component_status()
    }

    /// Updates, oldest first.
    pub fn updates(&self) -> &[IncidentUpdate] {
        &self.incident.updates
    }

    /// The most recently posted update.
    pub fn latest_update(&self) -> Option<&IncidentUpdate> {
        self.incident.updates.last()
    }
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

fn null_as_epoch<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DateTime<Utc>>::deserialize(deserializer).map(|t| t.unwrap_or_else(unix_epoch))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
