//! Snapshot file persistence for the in-memory document store.

use super::document::{Document, UserEntry};
use crate::core::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ============================================================================
// Store Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub documents: Vec<Document>,
    #[serde(default)]
    pub users: Vec<UserEntry>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub document_count: usize,
    pub user_count: usize,
}

impl StoreSnapshot {
    pub fn new(documents: Vec<Document>, users: Vec<UserEntry>) -> Self {
        let metadata = SnapshotMetadata {
            created_at: Utc::now(),
            document_count: documents.len(),
            user_count: users.len(),
        };

        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            documents,
            users,
            metadata,
        }
    }
}

// ============================================================================
// Atomic file writes
// ============================================================================

/// Replace `path` with `bytes` so readers see either the old or the new file.
///
/// The data is written to a temporary file in the target directory, synced,
/// then moved over the target.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let serialized = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Io(format!("Failed to serialize snapshot: {}", e)))?;
        write_atomically(&self.snapshot_path, &serialized).map_err(|e| {
            StoreError::Io(format!(
                "Failed to write snapshot {}: {}",
                self.snapshot_path.display(),
                e
            ))
        })
    }

    pub fn load(&self) -> StoreResult<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| StoreError::Io(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: StoreSnapshot = serde_json::from_slice(&data).map_err(|e| {
            StoreError::Corrupt(format!("{}: {}", self.snapshot_path.display(), e))
        })?;
        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::Corrupt(format!(
                "{}: unsupported snapshot version {}",
                self.snapshot_path.display(),
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}
