//! The reconcile cycle: fetch incidents, diff against the store, mirror to Discord.
//!
//! # Per-incident paths
//!
//! - **New** (no record): announce in the channel, optionally crosspost,
//!   create the incident role and thread, then persist the record.
//! - **Update** (record exists and the latest update is newer than
//!   `updated_at`): re-render the announcement, post the update into the
//!   thread, clean up artifacts if the incident is terminal, then persist.
//! - **Unchanged**: no calls at all.
//!
//! Incidents are processed one after another. A failing incident is logged
//! and skipped without affecting the rest. Nothing is rolled back: a new path
//! that fails after posting its message leaves no record, so the next cycle
//! treats the incident as new again and posts a fresh announcement.

mod report;


use std::fmt::{self, Display};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use report::{CycleReport, IncidentOutcome, Step};

use crate::effects::{DiscordInterpreter, Sink, THREAD_AUTO_ARCHIVE_MINUTES};
use crate::persistence::IncidentStore;
use crate::render;
use crate::statuspage::{FetchError, StatusSource};
use crate::types::{
    Artifacts, ChannelId, GuildId, IncidentId, IncidentRecord, OrderedIncident, RoleId,
};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to fetch incidents: {0}")]
    Fetch(#[from] FetchError),

    #[error("cycle exceeded its execution deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("cycle interrupted by shutdown")]
    Cancelled,
}

/// Where incidents are announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    /// Role pinged by every new-incident announcement.
    pub update_role_id: RoleId,
    /// Crosspost announcements when the channel is an announcement channel.
    pub crosspost: bool,
}

/// Name shared by an incident's role and thread.
pub fn artifact_name(id: &IncidentId) -> String {
    format!("Incident Updates: {id}")
}

/// Why an incident was abandoned mid-path.
struct Skip {
    step: Step,
    error: String,
}

impl Skip {
    fn at<E: fmt::Display>(step: Step) -> impl FnOnce(E) -> Skip {
        move |e| Skip {
            step,
            error: e.to_string(),
        }
    }
}

pub struct Reconciler<Src, D, S> {
    source: Src,
    discord: D,
    store: S,
    config: ReconcilerConfig,
}

impl<Src, D, S> Reconciler<Src, D, S>
where
    Src: StatusSource + Sync,
    D: DiscordInterpreter + Sync,
    D::Error: Display,
    S: IncidentStore,
{
    pub fn new(source: Src, discord: D, store: S, config: ReconcilerConfig) -> Self {
        Reconciler {
            source,
            discord,
            store,
            config,
        }
    }

    /// One fetch-diff-apply pass over every incident the provider lists.
    ///
    /// Only a failed fetch fails the cycle. Per-incident failures are logged
    /// and counted as skipped in the report.
    #[instrument(skip(self), fields(channel_id = %self.config.channel_id))]
    pub async fn run_once(&self) -> Result<CycleReport, ReconcileError> {
        let incidents = self.source.fetch_incidents().await?;
        debug!(count = incidents.len(), "Fetched incidents");

        let mut report = CycleReport::new(incidents.len());
        for incident in incidents {
            let outcome = self
                .reconcile_incident(OrderedIncident::from_provider(incident))
                .await;
            report.record(&outcome);
        }

        Ok(report)
    }

    #[instrument(skip_all, fields(incident_id = %incident.id()))]
    pub async fn reconcile_incident(&self, incident: OrderedIncident) -> IncidentOutcome {
        let result = match self.store.get(incident.id()) {
            Ok(None) => self.announce_new(&incident).await,
            Ok(Some(record)) => self.mirror_update(&incident, record).await,
            Err(e) => Err(Skip::at(Step::Lookup)(e)),
        };

        match result {
            Ok(outcome) => outcome,
            Err(Skip { step, error }) => {
                warn!(%step, %error, "Skipping incident for this cycle");
                IncidentOutcome::Skipped { step, error }
            }
        }
    }

    async fn announce_new(&self, incident: &OrderedIncident) -> Result<IncidentOutcome, Skip> {
        let sink = Sink::new(&self.discord);
        let channel = self.config.channel_id;
        info!(status = %incident.status(), "New incident, posting announcement");

        let message_id = sink
            .create_message(
                channel,
                render::announcement(incident, self.config.update_role_id),
            )
            .await
            .map_err(Skip::at(Step::CreateMessage))?;

        let channel_type = sink
            .get_channel_type(channel)
            .await
            .map_err(Skip::at(Step::GetChannelType))?;
        if self.config.crosspost && channel_type.supports_crosspost() {
            match sink.crosspost_message(channel, message_id).await {
                Ok(()) => debug!(%message_id, "Crossposted announcement"),
                Err(e) => warn!(%message_id, error = %e, "Failed to crosspost announcement"),
            }
        }

        let name = artifact_name(incident.id());
        let role_id = sink
            .create_role(self.config.guild_id, name.clone())
            .await
            .map_err(Skip::at(Step::CreateRole))?;
        let thread_id = sink
            .create_thread(channel, message_id, name, THREAD_AUTO_ARCHIVE_MINUTES)
            .await
            .map_err(Skip::at(Step::CreateThread))?;

        let artifacts = Artifacts {
            role_id,
            message_id,
            thread_id,
        };
        let record = IncidentRecord::new(
            incident.id().clone(),
            artifacts,
            incident.status().clone(),
            Utc::now(),
        );
        self.store
            .upsert(record)
            .map_err(Skip::at(Step::Persist))?;

        info!(%message_id, %role_id, %thread_id, "Incident announced");
        Ok(IncidentOutcome::Created {
            message_id,
            role_id,
            thread_id,
        })
    }

    async fn mirror_update(
        &self,
        incident: &OrderedIncident,
        mut record: IncidentRecord,
    ) -> Result<IncidentOutcome, Skip> {
        let Some(latest) = incident.latest_update() else {
            debug!("Incident has no updates");
            return Ok(IncidentOutcome::Unchanged);
        };
        if !record.is_behind(latest.display_at) {
            return Ok(IncidentOutcome::Unchanged);
        }

        let sink = Sink::new(&self.discord);
        let message_id = record.message_id();
        let thread_id = record.thread_id();
        info!(%message_id, %thread_id, status = %incident.status(), "New update, refreshing announcement");

        sink.edit_message(
            self.config.channel_id,
            message_id,
            render::announcement(incident, self.config.update_role_id),
        )
        .await
        .map_err(Skip::at(Step::EditMessage))?;

        sink.create_message(
            ChannelId::from(thread_id),
            render::thread_update(incident, latest, record.role_id()),
        )
        .await
        .map_err(Skip::at(Step::PostUpdate))?;

        let terminal = incident.status().is_terminal();
        if terminal {
            self.clean_up(&sink, &record).await;
        }

        record.observe(incident.status().clone(), Utc::now());
        self.store
            .upsert(record)
            .map_err(Skip::at(Step::Persist))?;

        Ok(IncidentOutcome::Updated { terminal })
    }

    /// Archives the thread and deletes the role. Failures are logged only.
    async fn clean_up(&self, sink: &Sink<'_, D>, record: &IncidentRecord) {
        let thread_id = record.thread_id();
        let role_id = record.role_id();
        info!(%thread_id, %role_id, "Incident ended, cleaning up artifacts");

        if let Err(e) = sink.archive_and_lock_thread(thread_id).await {
            warn!(%thread_id, error = %e, "Failed to archive thread");
        }
        if let Err(e) = sink.delete_role(self.config.guild_id, role_id).await {
            warn!(%role_id, error = %e, "Failed to delete role");
        }
    }
}
