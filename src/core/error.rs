use thiserror::Error;

/// Errors raised by a [`DocumentStore`](crate::storage::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store I/O error: {0}")]
    Io(String),

    #[error("Corrupt store snapshot: {0}")]
    Corrupt(String),
}

/// A STATUS payload that does not match the expected shape.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Malformed STATUS payload in document '{document_id}': {reason}")]
    Malformed { document_id: String, reason: String },

    #[error("STATUS document '{document_id}', action '{action_id}': missing field '{field}'")]
    MissingField {
        document_id: String,
        action_id: String,
        field: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Failed to encode RESPONSE document: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;
