//! STATUS to RESPONSE conversion pipeline.

pub mod driver;
pub mod expander;
pub mod grouping;
pub mod writer;

pub use driver::Migrator;
pub use expander::{
    EXPIRY_THRESHOLD_DAYS, LifeCycle, ResponseIter, ResponseRecord, ResponseState, age_in_days,
    expand_responses,
};
pub use grouping::{GroupKey, SnapshotWindow, group_documents};
pub use writer::{ResponseWriter, WriteOutcome};

use std::fmt;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationStats {
    /// Applications fully processed
    pub applications: usize,
    /// STATUS groups expanded into responses
    pub documents_split: usize,
    /// RESPONSE documents written
    pub responses_created: usize,
    /// Candidate responses that already existed
    pub responses_skipped: usize,
}

impl fmt::Display for MigrationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total number of STATUS document found: {}", self.documents_split)?;
        writeln!(f, "Total number of RESPONSE document created: {}", self.responses_created)?;
        write!(f, "Total number of RESPONSE document already present: {}", self.responses_skipped)
    }
}
