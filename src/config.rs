use crate::core::{MigrationError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const DEFAULT_CHECKPOINT_PATH: &str = "./prevSnapshot.txt";
pub const DEFAULT_STORE_PATH: &str = "./documents.json";
pub const DEFAULT_KEYSPACE: &str = "unifiedpush_server";

/// Settings for one migration run.
///
/// Built once by the caller and passed by reference to the components that
/// need it.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// File listing application ids, one per line
    pub application_ids_path: PathBuf,

    /// File holding the watermark of the last successful run
    pub checkpoint_path: PathBuf,

    /// Snapshot file of the document store
    pub store_path: PathBuf,

    /// Keyspace the documents live in (reported in logs)
    pub keyspace: String,

    /// Log every window and response, not only inserts
    pub verbose: bool,
}

impl MigrationConfig {
    pub fn new<P: AsRef<Path>>(application_ids_path: P) -> Self {
        Self {
            application_ids_path: application_ids_path.as_ref().to_path_buf(),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            keyspace: DEFAULT_KEYSPACE.to_string(),
            verbose: false,
        }
    }

    /// Set the checkpoint file path
    pub fn checkpoint_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.checkpoint_path = path.as_ref().to_path_buf();
        self
    }

    /// Set the store snapshot path
    pub fn store_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.store_path = path.as_ref().to_path_buf();
        self
    }

    pub fn keyspace(mut self, keyspace: &str) -> Self {
        self.keyspace = keyspace.to_string();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.application_ids_path.as_os_str().is_empty() {
            return Err(MigrationError::Config(
                "application ids path cannot be empty".to_string(),
            ));
        }

        if self.checkpoint_path.as_os_str().is_empty() {
            return Err(MigrationError::Config(
                "checkpoint path cannot be empty".to_string(),
            ));
        }

        if self.checkpoint_path.is_dir() {
            return Err(MigrationError::Config(format!(
                "checkpoint path {} is a directory",
                self.checkpoint_path.display()
            )));
        }

        if self.keyspace.trim().is_empty() {
            return Err(MigrationError::Config("keyspace cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Read and parse the application id file.
    pub fn load_application_ids(&self) -> Result<Vec<Uuid>> {
        let text = fs::read_to_string(&self.application_ids_path).map_err(|e| {
            MigrationError::Config(format!(
                "cannot read application ids from {}: {}",
                self.application_ids_path.display(),
                e
            ))
        })?;
        parse_application_ids(&text)
    }
}

/// Parse one UUID per line. Blank lines are skipped.
pub fn parse_application_ids(text: &str) -> Result<Vec<Uuid>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            Uuid::parse_str(line.trim()).map_err(|e| {
                MigrationError::Config(format!(
                    "line {}: invalid application id '{}': {}",
                    index + 1,
                    line.trim(),
                    e
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = MigrationConfig::new("apps.txt");
        assert_eq!(config.checkpoint_path, PathBuf::from(DEFAULT_CHECKPOINT_PATH));
        assert_eq!(config.keyspace, DEFAULT_KEYSPACE);
        assert!(!config.verbose);
    }

    #[test]
    fn test_builder_pattern() {
        let config = MigrationConfig::new("apps.txt")
            .checkpoint_path("/tmp/wm.txt")
            .store_path("/tmp/store.json")
            .keyspace("other")
            .verbose(true);

        assert_eq!(config.checkpoint_path, PathBuf::from("/tmp/wm.txt"));
        assert_eq!(config.store_path, PathBuf::from("/tmp/store.json"));
        assert_eq!(config.keyspace, "other");
        assert!(config.verbose);
    }

    #[test]
    fn test_validate() {
        assert!(MigrationConfig::new("apps.txt").validate().is_ok());
        assert!(MigrationConfig::new("").validate().is_err());
        assert!(MigrationConfig::new("apps.txt").keyspace(" ").validate().is_err());

        let dir = tempdir().unwrap();
        let checkpoint_is_dir = MigrationConfig::new("apps.txt").checkpoint_path(dir.path());
        assert!(checkpoint_is_dir.validate().is_err());
    }

    #[test]
    fn test_parse_application_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let text = format!("{}\n\n  {}  \n", a, b);
        assert_eq!(parse_application_ids(&text).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_parse_application_ids_reports_line() {
        let text = format!("{}\nnot-a-uuid\n", Uuid::new_v4());
        let err = parse_application_ids(&text).unwrap_err();
        assert!(matches!(err, MigrationError::Config(ref msg) if msg.starts_with("line 2")));
    }

    #[test]
    fn test_missing_application_file_is_config_error() {
        let dir = tempdir().unwrap();
        let config = MigrationConfig::new(dir.path().join("missing.txt"));
        assert!(matches!(
            config.load_application_ids(),
            Err(MigrationError::Config(_))
        ));
    }
}
