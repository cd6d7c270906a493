// ============================================================================
// statusmigrate Library
// ============================================================================

pub mod checkpoint;
pub mod config;
pub mod core;
pub mod migration;
pub mod storage;

// Re-export main types for convenience
pub use checkpoint::{FileWatermarkStore, WatermarkStore};
pub use config::MigrationConfig;
pub use self::core::{MigrationError, PayloadError, Result, StoreError, TimeUuid};
pub use migration::{
    LifeCycle, MigrationStats, Migrator, ResponseRecord, ResponseState, ResponseWriter,
    WriteOutcome,
};
pub use storage::{Database, Document, DocumentQuery, DocumentStore, InMemoryDocumentStore};
