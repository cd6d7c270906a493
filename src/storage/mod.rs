pub mod document;
pub mod memory;
pub mod persistence;
pub mod query;

pub use document::{Database, Document, DocumentKey, JSON_CONTENT_TYPE, UserEntry};
pub use memory::InMemoryDocumentStore;
pub use persistence::{SnapshotManager, StoreSnapshot, write_atomically};
pub use query::{DocumentQuery, USER_MONTH_BUCKETS};

use crate::core::StoreResult;
use async_trait::async_trait;
use uuid::Uuid;

/// The document store the migration reads STATUS documents from and writes
/// RESPONSE documents to.
///
/// Calls are issued one at a time by a single driver; implementations do not
/// need to coordinate concurrent writers, but must be `Send + Sync` so they
/// can be shared across an async runtime.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All users registered for `application_id` across the month buckets
    /// of the user lookup. Each user appears once.
    async fn list_users(&self, application_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Documents matching every filter of `query`, up to its limit.
    async fn find_documents(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>>;

    /// Write `document`, replacing any row with the same primary key.
    async fn insert(&self, document: Document) -> StoreResult<()>;

    /// Insert `document` unless a document with the same application,
    /// database, user and document id already exists. Returns whether the
    /// document was written.
    ///
    /// The default runs a lookup followed by an insert and is therefore not
    /// atomic. Backends with a conditional insert should override it.
    async fn insert_if_absent(&self, document: Document) -> StoreResult<bool> {
        let query = DocumentQuery::new(document.push_application_id, document.database)
            .user(document.user_id)
            .document_id(document.document_id.clone())
            .limit(1);
        if !self.find_documents(&query).await?.is_empty() {
            return Ok(false);
        }
        self.insert(document).await?;
        Ok(true)
    }

    /// Release the store. Further calls may fail.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}
