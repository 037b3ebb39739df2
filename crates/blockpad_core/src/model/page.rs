//! Page domain model.
//!
//! # Responsibility
//! - Define the titled document node that owns an ordered block sequence.
//! - Carry forest position (`parentId`) and opaque page metadata.
//!
//! # Invariants
//! - `blocks` is never empty.
//! - `title` is never blank; cleared titles fall back to a placeholder.
//! - `updated_at` is refreshed on every content-affecting mutation.

use crate::model::block::{generate_block_id, Block, BlockId};
use crate::model::{deserialize_epoch_ms, now_epoch_ms};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Stable page identifier.
pub type PageId = String;

/// Title used when a page title is cleared.
pub const DEFAULT_PAGE_TITLE: &str = "Untitled";

/// Glyph used when a page has no icon.
pub const DEFAULT_PAGE_ICON: &str = "📄";

/// Titled document node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub title: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    pub blocks: Vec<Block>,
    /// Free-form metadata (`tags`, `status`, ...). Never interpreted here.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    /// Non-owning back-reference. `None` means root page.
    #[serde(default)]
    pub parent_id: Option<PageId>,
    #[serde(default)]
    pub expanded: bool,
    /// Unix epoch milliseconds. ISO-8601 strings are accepted on load.
    #[serde(default, deserialize_with = "deserialize_epoch_ms")]
    pub created_at: i64,
    /// Unix epoch milliseconds. ISO-8601 strings are accepted on load.
    #[serde(default, deserialize_with = "deserialize_epoch_ms")]
    pub updated_at: i64,
}

fn default_icon() -> String {
    DEFAULT_PAGE_ICON.to_string()
}

impl Page {
    /// Creates a page holding one empty `text` block.
    pub fn new(title: impl Into<String>, parent_id: Option<PageId>) -> Self {
        Self::with_blocks(title, parent_id, Vec::new())
    }

    /// Creates a page over the given blocks.
    ///
    /// An empty block list is replaced by one empty `text` block.
    pub fn with_blocks(
        title: impl Into<String>,
        parent_id: Option<PageId>,
        mut blocks: Vec<Block>,
    ) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::empty_text());
        }
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4().to_string(),
            title: normalize_title(title.into(), DEFAULT_PAGE_TITLE),
            icon: default_icon(),
            blocks,
            properties: BTreeMap::new(),
            parent_id,
            expanded: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn block_index(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|block| block.id == block_id)
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == block_id)
    }

    pub fn block_mut(&mut self, block_id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id == block_id)
    }

    /// Refreshes `updated_at`, never moving it backwards.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }

    /// Repairs block-level invariants found in persisted data.
    ///
    /// Returns whether the page changed.
    pub(crate) fn repair(&mut self, fallback_title: &str, fallback_icon: &str) -> bool {
        let mut changed = false;
        if self.title.trim().is_empty() {
            self.title = fallback_title.to_string();
            changed = true;
        }
        if self.icon.is_empty() {
            self.icon = fallback_icon.to_string();
            changed = true;
        }
        if self.blocks.is_empty() {
            self.blocks.push(Block::empty_text());
            changed = true;
        }
        let mut seen: HashSet<BlockId> = HashSet::new();
        for block in &mut self.blocks {
            changed |= block.repair();
            if !seen.insert(block.id.clone()) {
                block.id = generate_block_id();
                seen.insert(block.id.clone());
                changed = true;
            }
        }
        changed
    }
}

/// Trims a title, substituting `fallback` when nothing is left.
pub fn normalize_title(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed.to_string()
}
