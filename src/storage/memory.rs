use super::document::{Document, DocumentKey, UserEntry};
use super::persistence::{SnapshotManager, StoreSnapshot};
use super::query::{DocumentQuery, USER_MONTH_BUCKETS};
use super::DocumentStore;
use crate::core::{StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Document store held in memory, optionally backed by a JSON snapshot file.
///
/// Rows are kept in primary-key order. When opened from a file, the whole
/// store is written back on [`flush`](Self::flush) and on
/// [`close`](DocumentStore::close).
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocumentKey, Document>>,
    users: RwLock<BTreeSet<UserEntry>>,
    snapshots: Option<SnapshotManager>,
    closed: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            users: RwLock::new(BTreeSet::new()),
            snapshots: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Open a store persisted at `path`. A missing file yields an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let manager = SnapshotManager::new(path);
        let mut documents = BTreeMap::new();
        let mut users = BTreeSet::new();

        match manager.load()? {
            Some(snapshot) => {
                info!(
                    path = %manager.path().display(),
                    documents = snapshot.documents.len(),
                    users = snapshot.users.len(),
                    "loaded document store snapshot"
                );
                for document in snapshot.documents {
                    documents.insert(document.key(), document);
                }
                users.extend(snapshot.users);
            }
            None => {
                info!(path = %manager.path().display(), "no store snapshot, starting empty");
            }
        }

        Ok(Self {
            documents: RwLock::new(documents),
            users: RwLock::new(users),
            snapshots: Some(manager),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("store is closed".into()));
        }
        Ok(())
    }

    /// Register `user_id` for `application_id` in a month bucket.
    pub async fn add_user(&self, application_id: Uuid, month: u8, user_id: Uuid) -> StoreResult<()> {
        self.ensure_open()?;
        self.users.write().await.insert(UserEntry {
            push_application_id: application_id,
            month,
            user_id,
        });
        Ok(())
    }

    /// Number of stored documents matching `query`, ignoring its limit.
    pub async fn count(&self, query: &DocumentQuery) -> StoreResult<usize> {
        self.ensure_open()?;
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|doc| query.matches(doc)).count())
    }

    /// Write the current contents to the snapshot file, if there is one.
    pub async fn flush(&self) -> StoreResult<()> {
        let Some(manager) = &self.snapshots else {
            return Ok(());
        };
        let documents: Vec<Document> = self.documents.read().await.values().cloned().collect();
        let users: Vec<UserEntry> = self.users.read().await.iter().copied().collect();
        debug!(path = %manager.path().display(), documents = documents.len(), "flushing document store");
        manager.save(&StoreSnapshot::new(documents, users))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list_users(&self, application_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.ensure_open()?;
        let users = self.users.read().await;
        let ids: BTreeSet<Uuid> = users
            .iter()
            .filter(|entry| {
                entry.push_application_id == application_id
                    && USER_MONTH_BUCKETS.contains(&entry.month)
            })
            .map(|entry| entry.user_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    async fn find_documents(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        self.ensure_open()?;
        let documents = self.documents.read().await;
        let matching = documents.values().filter(|doc| query.matches(doc)).cloned();
        Ok(match query.get_limit() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn insert(&self, document: Document) -> StoreResult<()> {
        self.ensure_open()?;
        self.documents.write().await.insert(document.key(), document);
        Ok(())
    }

    /// Lookup and insert happen under one write lock, so two writers cannot
    /// both create the same document.
    async fn insert_if_absent(&self, document: Document) -> StoreResult<bool> {
        self.ensure_open()?;
        let mut documents = self.documents.write().await;
        let exists = documents.values().any(|existing| {
            existing.push_application_id == document.push_application_id
                && existing.database == document.database
                && existing.user_id == document.user_id
                && existing.document_id == document.document_id
        });
        if exists {
            return Ok(false);
        }
        documents.insert(document.key(), document);
        Ok(true)
    }

    async fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.flush().await
    }
}
