//! Undo records for highlight mutations.
//!
//! Every container element is captured once per pattern key, before any node under
//! it is touched. Replaying a journal walks its records newest-first; a container that
//! an earlier restore already rebuilt (and so freed) is skipped.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::models::{DocTree, DocTreeError, Fragment, NodeId};
use crate::services::PatternKey;

#[derive(Debug, Clone)]
pub struct RestoreRecord {
    pub container: NodeId,
    pub snapshot: Fragment,
}

#[derive(Debug, Default)]
pub struct RestoreJournal {
    records: Vec<RestoreRecord>,
    seen: FxHashSet<NodeId>,
}

impl RestoreJournal {
    /// First write wins: returns `false` when `container` was already captured.
    pub fn capture(&mut self, tree: &DocTree, container: NodeId) -> Result<bool, DocTreeError> {
        if self.seen.contains(&container) {
            return Ok(false);
        }
        let snapshot = tree.snapshot_children(container)?;
        self.seen.insert(container);
        self.records.push(RestoreRecord {
            container,
            snapshot,
        });
        Ok(true)
    }

    pub fn records(&self) -> &[RestoreRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Restores every still-attached container; returns how many were restored.
    pub fn replay(self, tree: &mut DocTree) -> usize {
        let mut restored = 0;
        for record in self.records.into_iter().rev() {
            if !tree.is_attached(record.container) {
                tracing::debug!("restore target detached, skipping");
                continue;
            }
            match tree.restore_children(record.container, &record.snapshot) {
                Ok(()) => restored += 1,
                Err(error) => tracing::warn!(error = %error, "restore record failed"),
            }
        }
        restored
    }
}

#[derive(Debug, Default)]
pub struct RestoreLog {
    journals: FxHashMap<PatternKey, RestoreJournal>,
}

impl RestoreLog {
    pub fn journal_mut(&mut self, key: &PatternKey) -> &mut RestoreJournal {
        self.journals.entry(key.clone()).or_default()
    }

    pub fn journal(&self, key: &PatternKey) -> Option<&RestoreJournal> {
        self.journals.get(key)
    }

    pub fn take(&mut self, key: &PatternKey) -> Option<RestoreJournal> {
        self.journals.remove(key)
    }

    pub fn keys(&self) -> Vec<PatternKey> {
        self.journals.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.journals.is_empty()
    }
}
