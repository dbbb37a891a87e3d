//! Message layouts for incident announcements and thread updates.

use crate::types::{IncidentId, IncidentUpdate, OrderedIncident, RoleId};

use super::components::{Button, Component, MessagePayload};
use super::severity::Severity;

/// Prefix of the custom id carried by the "Receive Updates" button.
pub const OPT_IN_PREFIX: &str = "incident-role-";

pub fn opt_in_custom_id(id: &IncidentId) -> String {
    format!("{OPT_IN_PREFIX}{id}")
}

/// Extracts the incident id from an opt-in button's custom id.
pub fn parse_opt_in_custom_id(custom_id: &str) -> Option<IncidentId> {
    custom_id
        .strip_prefix(OPT_IN_PREFIX)
        .filter(|id| !id.is_empty())
        .map(IncidentId::from)
}

/// `in_progress` becomes `In Progress`.
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn update_line(update: &IncidentUpdate) -> String {
    format!("[<t:{}:t>] {}", update.display_at.timestamp(), update.body)
}

fn title(incident: &OrderedIncident) -> Component {
    let severity = Severity::from_lead_component(incident.lead_component_status());
    Component::text(format!("## {} - {}", severity, incident.name()))
}

fn accent_color(incident: &OrderedIncident) -> Option<u32> {
    Some(Severity::from_lead_component(incident.lead_component_status()).accent_color())
}

/// The whole incident: every update oldest first, plus the action row.
pub fn full_view(incident: &OrderedIncident) -> Component {
    let timeline = incident
        .updates()
        .iter()
        .map(update_line)
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut buttons = vec![Button::link("Status Page", incident.shortlink())];
    if !incident.status().is_terminal() {
        buttons.push(Button::action(
            "Receive Updates",
            opt_in_custom_id(incident.id()),
        ));
    }

    Component::Container {
        accent_color: accent_color(incident),
        components: vec![
            title(incident),
            Component::Separator,
            Component::text(timeline),
            Component::text(format!("Status: {}", title_case(incident.status().as_str()))),
            Component::ActionRow(buttons),
        ],
    }
}

/// A single update, as posted into the incident thread.
pub fn update_view(incident: &OrderedIncident, update: &IncidentUpdate) -> Component {
    Component::Container {
        accent_color: accent_color(incident),
        components: vec![
            title(incident),
            Component::Separator,
            Component::text(update_line(update)),
            Component::text(format!("Status: {}", title_case(update.status.as_str()))),
        ],
    }
}

/// The channel announcement, pinging everyone who follows incidents.
pub fn announcement(incident: &OrderedIncident, update_role: RoleId) -> MessagePayload {
    MessagePayload::new(vec![
        Component::text(format!(
            "-# A new incident has been reported {}",
            update_role.mention()
        )),
        full_view(incident),
    ])
    .mentioning(update_role)
}

/// The thread post for one new update, pinging the incident's own role.
pub fn thread_update(
    incident: &OrderedIncident,
    update: &IncidentUpdate,
    incident_role: RoleId,
) -> MessagePayload {
    MessagePayload::new(vec![
        Component::text(format!(
            "-# A new update has been posted {}",
            incident_role.mention()
        )),
        update_view(incident, update),
    ])
    .mentioning(incident_role)
}

/// Ephemeral reply to a successful opt-in click.
pub fn opt_in_confirmation() -> MessagePayload {
    MessagePayload::new(vec![Component::Container {
        accent_color: None,
        components: vec![Component::text(
            "You have been added to the incident updates role and thread.",
        )],
    }])
    .ephemeral()
}
