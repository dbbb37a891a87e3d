//! Discord message components (the "components v2" layout system).
//!
//! Only the handful of component kinds this bot emits are modelled. Each
//! serializes to the JSON object Discord expects, tagged by its numeric
//! `type`.

use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::types::RoleId;

/// Marks a message as using the components v2 layout.
pub const FLAG_COMPONENTS_V2: u64 = 1 << 15;

/// Makes an interaction reply visible only to the invoking user.
pub const FLAG_EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonStyle {
    Secondary,
    Link,
}

impl ButtonStyle {
    fn code(self) -> u8 {
        match self {
            ButtonStyle::Secondary => 2,
            ButtonStyle::Link => 5,
        }
    }
}

/// A button. Link buttons carry a `url`, interactive ones a `custom_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Button {
    pub style: ButtonStyle,
    pub label: String,
    pub target: ButtonTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ButtonTarget {
    Url(String),
    CustomId(String),
}

impl Button {
    pub fn link(label: impl Into<String>, url: impl Into<String>) -> Self {
        Button {
            style: ButtonStyle::Link,
            label: label.into(),
            target: ButtonTarget::Url(url.into()),
        }
    }

    pub fn action(label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Button {
            style: ButtonStyle::Secondary,
            label: label.into(),
            target: ButtonTarget::CustomId(custom_id.into()),
        }
    }

    pub fn custom_id(&self) -> Option<&str> {
        match &self.target {
            ButtonTarget::CustomId(id) => Some(id),
            ButtonTarget::Url(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    ActionRow(Vec<Button>),
    TextDisplay(String),
    Separator,
    Container {
        accent_color: Option<u32>,
        components: Vec<Component>,
    },
}

impl Component {
    pub fn text(content: impl Into<String>) -> Self {
        Component::TextDisplay(content.into())
    }

    /// The numeric component type on the wire.
    pub fn kind(&self) -> u8 {
        match self {
            Component::ActionRow(_) => 1,
            Component::TextDisplay(_) => 10,
            Component::Separator => 14,
            Component::Container { .. } => 17,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Component::ActionRow(buttons) => json!({
                "type": self.kind(),
                "components": buttons.iter().map(button_json).collect::<Vec<_>>(),
            }),
            Component::TextDisplay(content) => json!({
                "type": self.kind(),
                "content": content,
            }),
            Component::Separator => json!({ "type": self.kind() }),
            Component::Container {
                accent_color,
                components,
            } => {
                let mut value = json!({
                    "type": self.kind(),
                    "components": components.iter().map(Component::to_json).collect::<Vec<_>>(),
                });
                if let Some(color) = accent_color {
                    value["accent_color"] = json!(color);
                }
                value
            }
        }
    }

    /// Every text display in this tree, depth first.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Component::TextDisplay(content) => out.push(content),
            Component::Container { components, .. } => {
                components.iter().for_each(|c| c.collect_texts(out))
            }
            Component::ActionRow(_) | Component::Separator => {}
        }
    }

    /// Every button in this tree, depth first.
    pub fn buttons(&self) -> Vec<&Button> {
        match self {
            Component::ActionRow(buttons) => buttons.iter().collect(),
            Component::Container { components, .. } => {
                components.iter().flat_map(Component::buttons).collect()
            }
            Component::TextDisplay(_) | Component::Separator => Vec::new(),
        }
    }
}

fn button_json(button: &Button) -> Value {
    let mut value = json!({
        "type": 2,
        "style": button.style.code(),
        "label": button.label,
    });
    match &button.target {
        ButtonTarget::Url(url) => value["url"] = json!(url),
        ButtonTarget::CustomId(id) => value["custom_id"] = json!(id),
    }
    value
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A complete message body: components plus the roles it may ping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessagePayload {
    pub components: Vec<Component>,
    /// Roles whose mention in the text is allowed to notify. Nothing else
    /// (users, `@everyone`) is ever pinged.
    pub mention_roles: Vec<RoleId>,
    pub ephemeral: bool,
}

impl MessagePayload {
    pub fn new(components: Vec<Component>) -> Self {
        MessagePayload {
            components,
            mention_roles: Vec::new(),
            ephemeral: false,
        }
    }

    pub fn mentioning(mut self, role: RoleId) -> Self {
        self.mention_roles.push(role);
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn flags(&self) -> u64 {
        let mut flags = FLAG_COMPONENTS_V2;
        if self.ephemeral {
            flags |= FLAG_EPHEMERAL;
        }
        flags
    }

    pub fn texts(&self) -> Vec<&str> {
        self.components.iter().flat_map(Component::texts).collect()
    }

    pub fn buttons(&self) -> Vec<&Button> {
        self.components.iter().flat_map(Component::buttons).collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "flags": self.flags(),
            "components": self.components.iter().map(Component::to_json).collect::<Vec<_>>(),
            "allowed_mentions": {
                "parse": [],
                "roles": self.mention_roles,
            },
        })
    }
}

impl Serialize for MessagePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_wire_format() {
        let container = Component::Container {
            accent_color: Some(0xFF0000),
            components: vec![
                Component::text("hello"),
                Component::Separator,
                Component::ActionRow(vec![
                    Button::link("Status Page", "https://example.com"),
                    Button::action("Receive Updates", "incident-role-abc"),
                ]),
            ],
        };

        let json = container.to_json();
        assert_eq!(json["type"], 17);
        assert_eq!(json["accent_color"], 0xFF0000);
        assert_eq!(json["components"][0], json!({"type": 10, "content": "hello"}));
        assert_eq!(json["components"][1], json!({"type": 14}));

        let row = &json["components"][2];
        assert_eq!(row["type"], 1);
        assert_eq!(row["components"][0]["style"], 5);
        assert_eq!(row["components"][0]["url"], "https://example.com");
        assert_eq!(row["components"][1]["style"], 2);
        assert_eq!(row["components"][1]["custom_id"], "incident-role-abc");
        assert!(row["components"][1].get("url").is_none());
    }

    #[test]
    fn container_without_accent_omits_field() {
        let json = Component::Container {
            accent_color: None,
            components: vec![],
        }
        .to_json();
        assert!(json.get("accent_color").is_none());
    }

    #[test]
    fn payload_restricts_mentions() {
        let payload = MessagePayload::new(vec![Component::text("x")]).mentioning(RoleId::new(5));
        let json = payload.to_json();

        assert_eq!(json["flags"], FLAG_COMPONENTS_V2);
        assert_eq!(json["allowed_mentions"], json!({"parse": [], "roles": ["5"]}));
    }

    #[test]
    fn ephemeral_payload_sets_both_flags() {
        let payload = MessagePayload::new(vec![]).ephemeral();
        assert_eq!(payload.flags(), FLAG_COMPONENTS_V2 | FLAG_EPHEMERAL);
        assert_eq!(payload.flags(), 32832);
    }

    #[test]
    fn walks_nested_texts_and_buttons() {
        let payload = MessagePayload::new(vec![
            Component::text("header"),
            Component::Container {
                accent_color: None,
                components: vec![
                    Component::text("body"),
                    Component::ActionRow(vec![Button::link("a", "b")]),
                ],
            },
        ]);
        assert_eq!(payload.texts(), vec!["header", "body"]);
        assert_eq!(payload.buttons().len(), 1);
    }
}
