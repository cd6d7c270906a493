use crate::core::TimeUuid;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Logical database a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Database {
    Status,
    Response,
}

impl Database {
    pub fn as_str(&self) -> &'static str {
        match self {
            Database::Status => "STATUS",
            Database::Response => "RESPONSE",
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the `documents` table.
///
/// The primary key is `(push_application_id, database, user_id, snapshot, document_id)`.
/// For STATUS documents `document_id` is the deployment id; for RESPONSE
/// documents it is the task id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub push_application_id: Uuid,
    pub database: Database,
    pub user_id: Uuid,
    pub snapshot: TimeUuid,
    pub document_id: String,
    pub content: String,
    pub content_type: String,
}

impl Document {
    pub fn new(
        push_application_id: Uuid,
        database: Database,
        user_id: Uuid,
        snapshot: TimeUuid,
        document_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            push_application_id,
            database,
            user_id,
            snapshot,
            document_id: document_id.into(),
            content: content.into(),
            content_type: JSON_CONTENT_TYPE.to_string(),
        }
    }

    pub fn key(&self) -> DocumentKey {
        DocumentKey {
            push_application_id: self.push_application_id,
            database: self.database,
            user_id: self.user_id,
            snapshot: self.snapshot,
            document_id: self.document_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    pub push_application_id: Uuid,
    pub database: Database,
    pub user_id: Uuid,
    pub snapshot: TimeUuid,
    pub document_id: String,
}

/// A row of the `users_by_application` lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserEntry {
    pub push_application_id: Uuid,
    pub month: u8,
    pub user_id: Uuid,
}
