pub mod error;
pub mod token;

pub use error::{MigrationError, PayloadError, Result, StoreError, StoreResult};
pub use token::TimeUuid;
