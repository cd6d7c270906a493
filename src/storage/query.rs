//! Typed, parameterized document queries.
//!
//! Every filter is a bound value on [`DocumentQuery`]; backends evaluate
//! the filters directly and no query text is ever assembled from values.

use super::document::{Database, Document};
use crate::core::TimeUuid;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Months covered by the `users_by_application` lookup.
pub const USER_MONTH_BUCKETS: std::ops::RangeInclusive<u8> = 1..=12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    application_id: Uuid,
    database: Database,
    user_ids: Option<BTreeSet<Uuid>>,
    snapshot_after: Option<TimeUuid>,
    document_id: Option<String>,
    limit: Option<usize>,
}

impl DocumentQuery {
    pub fn new(application_id: Uuid, database: Database) -> Self {
        Self {
            application_id,
            database,
            user_ids: None,
            snapshot_after: None,
            document_id: None,
            limit: None,
        }
    }

    /// Restrict to a set of users (`user_id IN (...)`).
    pub fn users(mut self, user_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.user_ids
            .get_or_insert_with(BTreeSet::new)
            .extend(user_ids);
        self
    }

    pub fn user(self, user_id: Uuid) -> Self {
        self.users([user_id])
    }

    /// Only documents whose snapshot is strictly greater than `token`.
    pub fn snapshot_after(mut self, token: TimeUuid) -> Self {
        self.snapshot_after = Some(token);
        self
    }

    pub fn document_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn application_id(&self) -> Uuid {
        self.application_id
    }

    pub fn database(&self) -> Database {
        self.database
    }

    pub fn user_ids(&self) -> Option<&BTreeSet<Uuid>> {
        self.user_ids.as_ref()
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether `document` satisfies every bound filter. The limit is not
    /// considered here.
    pub fn matches(&self, document: &Document) -> bool {
        if document.push_application_id != self.application_id
            || document.database != self.database
        {
            return false;
        }
        if let Some(users) = &self.user_ids {
            if !users.contains(&document.user_id) {
                return false;
            }
        }
        if let Some(after) = &self.snapshot_after {
            if document.snapshot <= *after {
                return false;
            }
        }
        if let Some(document_id) = &self.document_id {
            if &document.document_id != document_id {
                return false;
            }
        }
        true
    }

    /// Human readable rendering of the query and its bound values, for logs.
    pub fn describe(&self) -> String {
        let mut parts = vec![
            format!("push_application_id = {}", self.application_id),
            format!("database = '{}'", self.database),
        ];
        if let Some(users) = &self.user_ids {
            parts.push(format!("user_id IN ({} ids)", users.len()));
        }
        if let Some(after) = &self.snapshot_after {
            parts.push(format!("snapshot > {}", after));
        }
        if let Some(document_id) = &self.document_id {
            parts.push(format!("document_id = '{}'", document_id));
        }
        let mut text = format!("SELECT FROM documents WHERE {}", parts.join(" AND "));
        if let Some(limit) = self.limit {
            text.push_str(&format!(" LIMIT {}", limit));
        }
        text
    }
}
