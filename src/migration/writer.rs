//! At-most-once creation of RESPONSE documents.

use super::expander::ResponseRecord;
use crate::core::{Result, TimeUuid};
use crate::storage::{Database, Document, DocumentQuery, DocumentStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new RESPONSE document was written with this snapshot token.
    Inserted(TimeUuid),
    AlreadyExists,
}

/// Writes RESPONSE documents keyed by (application, user, task id), skipping
/// keys that already have one.
pub struct ResponseWriter<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> ResponseWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn put_if_absent(
        &self,
        record: &ResponseRecord,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<WriteOutcome> {
        let lookup = DocumentQuery::new(application_id, Database::Response)
            .user(user_id)
            .document_id(record.task_id.clone())
            .limit(1);
        let exists = !self.store.find_documents(&lookup).await?.is_empty();
        debug!(task_id = %record.task_id, %user_id, exists, "RESPONSE existence check");
        if exists {
            return Ok(WriteOutcome::AlreadyExists);
        }

        let snapshot = TimeUuid::now();
        let content = serde_json::to_string(record)?;
        let document = Document::new(
            application_id,
            Database::Response,
            user_id,
            snapshot,
            record.task_id.clone(),
            content,
        );

        if !self.store.insert_if_absent(document).await? {
            warn!(task_id = %record.task_id, %user_id, "RESPONSE appeared between check and insert");
            return Ok(WriteOutcome::AlreadyExists);
        }

        info!(
            %application_id,
            database = %Database::Response,
            %user_id,
            %snapshot,
            document_id = %record.task_id,
            "inserted RESPONSE document"
        );
        Ok(WriteOutcome::Inserted(snapshot))
    }
}
