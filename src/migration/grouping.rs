//! Grouping of STATUS documents into per-(deployment, user) snapshot windows.

use crate::core::TimeUuid;
use crate::storage::Document;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use uuid::Uuid;

/// Identifies one deployment as seen by one user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    /// Deployment id (the STATUS document id)
    pub document_id: String,
    pub user_id: Uuid,
}

/// Earliest and latest observation of one group.
#[derive(Debug, Clone)]
pub struct SnapshotWindow {
    /// Earliest snapshot seen; only used to compute the group's age.
    pub min_snapshot: TimeUuid,
    /// Document carrying the latest snapshot; its content is authoritative.
    pub latest: Document,
}

impl SnapshotWindow {
    fn new(document: Document) -> Self {
        Self {
            min_snapshot: document.snapshot,
            latest: document,
        }
    }

    fn observe(&mut self, document: Document) {
        if document.snapshot < self.min_snapshot {
            self.min_snapshot = document.snapshot;
        }
        if document.snapshot > self.latest.snapshot {
            self.latest = document;
        }
    }

    pub fn max_snapshot(&self) -> TimeUuid {
        self.latest.snapshot
    }
}

/// Partition `documents` by (document id, user id), keeping per group the
/// document with the greatest snapshot and the smallest snapshot seen.
///
/// On equal snapshots the first document seen is kept.
pub fn group_documents<I>(documents: I) -> HashMap<GroupKey, SnapshotWindow>
where
    I: IntoIterator<Item = Document>,
{
    let mut groups = HashMap::new();
    for document in documents {
        let key = GroupKey {
            document_id: document.document_id.clone(),
            user_id: document.user_id,
        };
        match groups.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(SnapshotWindow::new(document));
            }
            Entry::Occupied(mut slot) => slot.get_mut().observe(document),
        }
    }
    groups
}
