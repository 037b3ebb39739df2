//! Snapshot-based undo/redo over the whole page forest.
//!
//! # Responsibility
//! - Record deep copies of the forest after each mutation.
//! - Restore earlier/later snapshots into a [`PageStore`].
//!
//! # Invariants
//! - History is linear: recording after an undo discards the redo branch.
//! - `entries.len() <= limit`; the newest snapshot is always at `index`
//!   right after a record.
//! - Snapshots never alias live store state.

use crate::model::{deserialize_epoch_ms, now_epoch_ms};
use crate::model::page::{Page, PageId};
use crate::store::page_store::PageStore;
use log::debug;
use serde::{Deserialize, Serialize};

/// Maximum number of retained snapshots.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One history entry: the full forest plus the then-current page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub pages: Vec<Page>,
    #[serde(default)]
    pub current_page_id: Option<PageId>,
    pub description: String,
    /// Unix epoch milliseconds.
    #[serde(default, deserialize_with = "deserialize_epoch_ms")]
    pub timestamp: i64,
}

/// Wire shape stored under the `history` blob key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub history: Vec<Snapshot>,
    /// `-1` when empty.
    pub index: i64,
}

/// Result of a successful undo/redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restored {
    /// Current page after restore; `None` when the snapshot's page is gone.
    pub current_page_id: Option<PageId>,
    /// Description of the step that was undone or redone.
    pub description: String,
}

/// Linear, bounded undo/redo log.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryManager {
    entries: Vec<Snapshot>,
    index: Option<usize>,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates an empty log retaining at most `limit` snapshots (minimum 1).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            limit: limit.max(1),
        }
    }

    /// Rebuilds a log from its persisted shape.
    ///
    /// Oldest entries beyond `limit` are dropped; the stored index is clamped
    /// into range.
    pub fn from_persisted(persisted: PersistedHistory, limit: usize) -> Self {
        let mut manager = Self::with_limit(limit);
        let mut entries = persisted.history;
        let mut index = persisted.index;

        let overflow = entries.len().saturating_sub(manager.limit);
        if overflow > 0 {
            entries.drain(..overflow);
            index = index.saturating_sub(overflow as i64);
        }

        manager.index = if entries.is_empty() {
            None
        } else {
            Some(index.clamp(0, entries.len() as i64 - 1) as usize)
        };
        manager.entries = entries;
        manager
    }

    /// Persisted shape of this log.
    pub fn to_persisted(&self) -> PersistedHistory {
        PersistedHistory {
            history: self.entries.clone(),
            index: self.index.map_or(-1, |index| index as i64),
        }
    }

    pub fn entries(&self) -> &[Snapshot] {
        &self.entries
    }

    /// Position of the current snapshot; `None` when empty.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }

    /// Records the current forest state.
    pub fn record(
        &mut self,
        store: &PageStore,
        current_page_id: Option<&str>,
        description: impl Into<String>,
    ) {
        if let Some(index) = self.index {
            self.entries.truncate(index + 1);
        }

        self.entries.push(Snapshot {
            pages: store.snapshot(),
            current_page_id: current_page_id.map(str::to_string),
            description: description.into(),
            timestamp: now_epoch_ms(),
        });

        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.index = Some(self.entries.len() - 1);
        debug!(
            "event=history_record module=history status=ok entries={} index={}",
            self.entries.len(),
            self.entries.len() - 1
        );
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|index| index > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index
            .is_some_and(|index| index + 1 < self.entries.len())
    }

    /// Label of the step `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.index
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.description.as_str())
    }

    /// Label of the step `redo` would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        if !self.can_redo() {
            return None;
        }
        self.index
            .and_then(|index| self.entries.get(index + 1))
            .map(|entry| entry.description.as_str())
    }

    /// Steps back one snapshot. No-op (returns `None`) at the oldest entry.
    pub fn undo(&mut self, store: &mut PageStore) -> Option<Restored> {
        let index = self.index.filter(|index| *index > 0)?;
        let description = self.entries[index].description.clone();
        self.index = Some(index - 1);
        let current_page_id = self.restore(index - 1, store);
        debug!(
            "event=history_undo module=history status=ok index={}",
            index - 1
        );
        Some(Restored {
            current_page_id,
            description,
        })
    }

    /// Steps forward one snapshot. No-op (returns `None`) at the newest entry.
    pub fn redo(&mut self, store: &mut PageStore) -> Option<Restored> {
        let index = self
            .index
            .filter(|index| index + 1 < self.entries.len())?;
        let description = self.entries[index + 1].description.clone();
        self.index = Some(index + 1);
        let current_page_id = self.restore(index + 1, store);
        debug!(
            "event=history_redo module=history status=ok index={}",
            index + 1
        );
        Some(Restored {
            current_page_id,
            description,
        })
    }

    fn restore(&self, index: usize, store: &mut PageStore) -> Option<PageId> {
        let snapshot = &self.entries[index];
        store.replace_pages(snapshot.pages.clone());
        snapshot
            .current_page_id
            .clone()
            .filter(|page_id| store.contains(page_id))
    }
}
