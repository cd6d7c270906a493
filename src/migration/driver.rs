use super::expander::{age_in_days, expand_responses};
use super::grouping::{GroupKey, SnapshotWindow, group_documents};
use super::writer::{ResponseWriter, WriteOutcome};
use super::MigrationStats;
use crate::checkpoint::WatermarkStore;
use crate::config::MigrationConfig;
use crate::core::{Result, TimeUuid};
use crate::storage::{Database, DocumentQuery, DocumentStore};
use chrono::{DateTime, Utc};
use tracing::{Instrument, Level, debug, event, info, info_span};
use uuid::Uuid;

/// Runs one migration pass over a list of applications.
///
/// Applications are processed one after another. The watermark captured
/// at the start of the run is saved only when every application succeeds;
/// any error leaves the previous watermark in place so the next run
/// revisits the same documents.
pub struct Migrator<'a, S, W>
where
    S: DocumentStore + ?Sized,
    W: WatermarkStore + ?Sized,
{
    config: &'a MigrationConfig,
    store: &'a S,
    watermarks: &'a W,
    started_at: Option<DateTime<Utc>>,
    stats: MigrationStats,
}

impl<'a, S, W> Migrator<'a, S, W>
where
    S: DocumentStore + ?Sized,
    W: WatermarkStore + ?Sized,
{
    pub fn new(config: &'a MigrationConfig, store: &'a S, watermarks: &'a W) -> Self {
        Self {
            config,
            store,
            watermarks,
            started_at: None,
            stats: MigrationStats::default(),
        }
    }

    /// Pin the run's start instant instead of reading the clock.
    pub fn with_start_time(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Counters accumulated so far, including by a failed run.
    pub fn stats(&self) -> &MigrationStats {
        &self.stats
    }

    /// Migrate every application and commit the new watermark.
    ///
    /// Returns the committed watermark.
    pub async fn run(&mut self, application_ids: &[Uuid]) -> Result<TimeUuid> {
        // Captured before any query so documents written during the run are
        // picked up next time.
        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let next_watermark = TimeUuid::min_for(started_at);
        let previous = self.watermarks.load();

        info!(
            keyspace = %self.config.keyspace,
            previous = %previous.timestamp(),
            next = %next_watermark.timestamp(),
            applications = application_ids.len(),
            "starting STATUS to RESPONSE migration"
        );

        for application_id in application_ids {
            let span = info_span!("migrate.application", %application_id);
            self.migrate_application(*application_id, &previous, started_at)
                .instrument(span)
                .await?;
            self.stats.applications += 1;
        }

        let committed = next_watermark.max(previous);
        self.watermarks.save(&committed)?;
        info!(watermark = %committed, at = %committed.timestamp(), "watermark committed");
        Ok(committed)
    }

    async fn migrate_application(
        &mut self,
        application_id: Uuid,
        previous: &TimeUuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let users = self.store.list_users(application_id).await?;
        if users.is_empty() {
            info!("application has no users, nothing to migrate");
            return Ok(());
        }

        let query = DocumentQuery::new(application_id, Database::Status)
            .users(users)
            .snapshot_after(*previous);
        debug!(query = %query.describe(), "fetching STATUS documents");
        let documents = self.store.find_documents(&query).await?;

        let mut groups: Vec<(GroupKey, SnapshotWindow)> =
            group_documents(documents).into_iter().collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        info!(groups = groups.len(), "grouped STATUS documents");

        let writer = ResponseWriter::new(self.store);
        for (key, window) in groups {
            let responses = expand_responses(&window.latest, &window.min_snapshot, now)?;
            if self.config.verbose {
                event!(
                    Level::INFO,
                    deploy_id = %key.document_id,
                    user_id = %key.user_id,
                    max_snapshot = %window.max_snapshot().timestamp().format("%d/%b/%Y"),
                    min_snapshot = %window.min_snapshot.timestamp().format("%d/%b/%Y"),
                    age_days = age_in_days(&window.min_snapshot, now),
                    life_cycle = ?responses.life_cycle(),
                    "snapshot window"
                );
            }

            for response in responses {
                let response = response?;
                if self.config.verbose {
                    let pretty = serde_json::to_string_pretty(&response)?;
                    event!(Level::INFO, response = %pretty, "candidate RESPONSE");
                }
                match writer.put_if_absent(&response, key.user_id, application_id).await? {
                    WriteOutcome::Inserted(_) => self.stats.responses_created += 1,
                    WriteOutcome::AlreadyExists => self.stats.responses_skipped += 1,
                }
            }
            self.stats.documents_split += 1;
        }
        Ok(())
    }
}
