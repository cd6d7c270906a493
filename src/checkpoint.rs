//! Persistence of the migration watermark between runs.

use crate::core::{MigrationError, Result, TimeUuid};
use crate::storage::write_atomically;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Holds the token marking the last successfully migrated snapshot.
pub trait WatermarkStore {
    /// The stored watermark, or [`TimeUuid::epoch`] when there is none or it
    /// cannot be read.
    fn load(&self) -> TimeUuid;

    fn save(&self, watermark: &TimeUuid) -> Result<()>;
}

/// Watermark kept as the text form of a token on the first line of a file.
#[derive(Debug, Clone)]
pub struct FileWatermarkStore {
    path: PathBuf,
}

impl FileWatermarkStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> std::result::Result<TimeUuid, String> {
        let text = fs::read_to_string(&self.path).map_err(|e| e.to_string())?;
        let first = text.lines().next().unwrap_or("").trim();
        if first.is_empty() {
            return Err("checkpoint file is empty".to_string());
        }
        first.parse()
    }
}

impl WatermarkStore for FileWatermarkStore {
    fn load(&self) -> TimeUuid {
        match self.read() {
            Ok(token) => token,
            Err(reason) => {
                if self.path.exists() {
                    warn!(path = %self.path.display(), %reason, "unreadable checkpoint, starting from epoch");
                } else {
                    info!(path = %self.path.display(), "no checkpoint yet, starting from epoch");
                }
                TimeUuid::epoch()
            }
        }
    }

    fn save(&self, watermark: &TimeUuid) -> Result<()> {
        write_atomically(&self.path, watermark.to_string().as_bytes()).map_err(|e| {
            let hint = if e.kind() == ErrorKind::NotFound {
                " (does the directory exist?)"
            } else {
                ""
            };
            MigrationError::Checkpoint(format!(
                "cannot write {}: {}{}",
                self.path.display(),
                e,
                hint
            ))
        })
    }
}
