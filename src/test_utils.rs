//! Shared test fixtures: incident builders, a recording Discord interpreter,
//! a scripted status source, and a store that counts writes.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use thiserror::Error;

use crate::effects::{ChannelType, DiscordEffect, DiscordInterpreter, DiscordResponse};
use crate::persistence::{IncidentStore, MemoryIncidentStore, StoreError};
use crate::statuspage::{FetchError, StatusSource};
use crate::types::{
    ComponentStatus, IncidentComponent, IncidentId, IncidentRecord, IncidentStatus,
    IncidentUpdate, MessageId, OrderedIncident, RemoteIncident, RoleId, ThreadId,
};

/// A UTC timestamp `secs` seconds after the Unix epoch.
pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("timestamp in range")
}

// ─── Incident builders ────────────────────────────────────────────────────────

pub struct IncidentBuilder {
    incident: RemoteIncident,
}

impl IncidentBuilder {
    pub fn new(id: &str, status: IncidentStatus) -> Self {
        IncidentBuilder {
            incident: RemoteIncident {
                id: IncidentId::from(id),
                name: "Test incident".to_string(),
                status,
                shortlink: format!("https://stspg.io/{id}"),
                components: Vec::new(),
                updates: Vec::new(),
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.incident.name = name.to_string();
        self
    }

    pub fn component(mut self, status: ComponentStatus) -> Self {
        let n = self.incident.components.len();
        self.incident.components.push(IncidentComponent {
            id: format!("c{n}"),
            name: format!("Component {n}"),
            status,
        });
        self
    }

    /// Appends an update in provider order, so call newest first.
    pub fn update(
        mut self,
        body: impl Into<String>,
        display_at: DateTime<Utc>,
        status: IncidentStatus,
    ) -> Self {
        let n = self.incident.updates.len();
        self.incident.updates.push(IncidentUpdate {
            id: format!("u{n}"),
            body: body.into(),
            display_at,
            status,
        });
        self
    }

    pub fn build(self) -> RemoteIncident {
        self.incident
    }

    pub fn ordered(self) -> OrderedIncident {
        OrderedIncident::from_provider(self.incident)
    }
}

pub fn record_at(
    id: &str,
    role: u64,
    message: u64,
    thread: u64,
    status: IncidentStatus,
    at: DateTime<Utc>,
) -> IncidentRecord {
    IncidentRecord::new(
        IncidentId::from(id),
        crate::types::Artifacts {
            role_id: RoleId::new(role),
            message_id: MessageId::new(message),
            thread_id: ThreadId::new(thread),
        },
        status,
        at,
    )
}

// ─── Recording Discord interpreter ────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("mock Discord failure on {0}")]
pub struct MockDiscordError(pub &'static str);

type FailPredicate = Box<dyn Fn(&DiscordEffect) -> bool + Send + Sync>;

/// Records every effect it is asked to run and answers with fresh ids.
///
/// Failed effects are recorded too, so counts reflect attempted calls.
pub struct RecordingDiscord {
    effects: Mutex<Vec<DiscordEffect>>,
    failures: Mutex<Vec<FailPredicate>>,
    channel_type: Mutex<ChannelType>,
    next_id: AtomicU64,
}

impl Default for RecordingDiscord {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDiscord {
    pub fn new() -> Self {
        RecordingDiscord {
            effects: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            channel_type: Mutex::new(ChannelType::GuildText),
            next_id: AtomicU64::new(1000),
        }
    }

    pub fn set_channel_type(&self, kind: ChannelType) {
        *self.channel_type.lock().unwrap() = kind;
    }

    /// Fails every effect of the given kind (see [`DiscordEffect::kind`]).
    pub fn fail_on(&self, kind: &'static str) {
        self.fail_when(move |effect| effect.kind() == kind);
    }

    pub fn fail_when(&self, predicate: impl Fn(&DiscordEffect) -> bool + Send + Sync + 'static) {
        self.failures.lock().unwrap().push(Box::new(predicate));
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn effects(&self) -> Vec<DiscordEffect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.effects.lock().unwrap().iter().map(DiscordEffect::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.effects
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        self.effects.lock().unwrap().clear();
    }

    fn respond(&self, effect: DiscordEffect) -> Result<DiscordResponse, MockDiscordError> {
        let kind = effect.kind();
        let fails = self.failures.lock().unwrap().iter().any(|p| p(&effect));
        self.effects.lock().unwrap().push(effect.clone());
        if fails {
            return Err(MockDiscordError(kind));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(match effect {
            DiscordEffect::CreateMessage { .. } => DiscordResponse::MessageCreated {
                id: MessageId::new(id),
            },
            DiscordEffect::CreateRole { .. } => DiscordResponse::RoleCreated {
                id: RoleId::new(id),
            },
            DiscordEffect::CreateThread { .. } => DiscordResponse::ThreadCreated {
                id: ThreadId::new(id),
            },
            DiscordEffect::GetChannelType { .. } => {
                DiscordResponse::ChannelType(*self.channel_type.lock().unwrap())
            }
            _ => DiscordResponse::Done,
        })
    }
}

impl DiscordInterpreter for RecordingDiscord {
    type Error = MockDiscordError;

    fn interpret(
        &self,
        effect: DiscordEffect,
    ) -> impl Future<Output = Result<DiscordResponse, Self::Error>> + Send {
        let result = self.respond(effect);
        async move { result }
    }
}

// ─── Scripted status source ───────────────────────────────────────────────────

/// Serves whatever incident list it was last given.
#[derive(Default)]
pub struct ScriptedSource {
    incidents: Mutex<Vec<RemoteIncident>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(incidents: Vec<RemoteIncident>) -> Self {
        ScriptedSource {
            incidents: Mutex::new(incidents),
            ..Default::default()
        }
    }

    pub fn set(&self, incidents: Vec<RemoteIncident>) {
        *self.incidents.lock().unwrap() = incidents;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl StatusSource for ScriptedSource {
    fn fetch_incidents(
        &self,
    ) -> impl Future<Output = Result<Vec<RemoteIncident>, FetchError>> + Send {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(FetchError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        } else {
            Ok(self.incidents.lock().unwrap().clone())
        };
        async move { result }
    }
}

// ─── Counting store ───────────────────────────────────────────────────────────

/// A memory store that counts upserts and can be told to fail them.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryIncidentStore,
    upserts: AtomicUsize,
    fail_upserts: AtomicBool,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Inserts without counting, for test setup.
    pub fn seed(&self, record: IncidentRecord) {
        self.inner.upsert(record).unwrap();
    }
}

impl IncidentStore for CountingStore {
    fn get(&self, id: &IncidentId) -> Result<Option<IncidentRecord>, StoreError> {
        self.inner.get(id)
    }

    fn upsert(&self, record: IncidentRecord) -> Result<(), StoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(StoreError::Poisoned);
        }
        self.inner.upsert(record)
    }
}

// ─── Proptest strategies ──────────────────────────────────────────────────────

pub fn arb_component_status() -> impl Strategy<Value = ComponentStatus> {
    prop_oneof![
        Just(ComponentStatus::Operational),
        Just(ComponentStatus::DegradedPerformance),
        Just(ComponentStatus::PartialOutage),
        Just(ComponentStatus::MajorOutage),
        Just(ComponentStatus::UnderMaintenance),
        "[a-z_]{1,16}".prop_map(ComponentStatus::from),
    ]
}
