//! Authoritative mutation and query surface over the page forest.
//!
//! # Responsibility
//! - Own every page and apply block/page mutations in place.
//! - Reject operations that would break model invariants.
//!
//! # Invariants
//! - A rejected operation leaves the forest untouched.
//! - Every page keeps at least one block; tables keep at least one row and
//!   one column.
//! - `parentId` links always resolve and never form a cycle.
//! - Root pages are created at the front of the ordering; child pages are
//!   appended after their existing siblings.

use crate::model::block::{Alignment, Block, BlockId, BlockType, TableData};
use crate::model::page::{normalize_title, Page, PageId, DEFAULT_PAGE_ICON, DEFAULT_PAGE_TITLE};
use crate::store::forest;
use log::warn;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by page store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Reasons a page store operation had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Target page does not exist.
    PageNotFound(PageId),
    /// Target block does not exist in the page.
    BlockNotFound { page_id: PageId, block_id: BlockId },
    /// Deleting the sole remaining block of a page.
    LastBlock(PageId),
    /// Table operation addressed at a non-table block.
    NotATable(BlockId),
    /// Removing the only row of a table.
    LastTableRow(BlockId),
    /// Removing the only column of a table.
    LastTableColumn(BlockId),
    /// Cell coordinates outside the table grid.
    CellOutOfRange {
        block_id: BlockId,
        row: usize,
        column: usize,
    },
    /// Custom property key shadows a typed block property.
    ReservedPropertyKey(String),
    /// Re-parent would make a page its own ancestor.
    CycleDetected { page_id: PageId, parent_id: PageId },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::BlockNotFound { page_id, block_id } => {
                write!(f, "block {block_id} not found in page {page_id}")
            }
            Self::LastBlock(id) => write!(f, "cannot delete the last block of page {id}"),
            Self::NotATable(id) => write!(f, "block is not a table: {id}"),
            Self::LastTableRow(id) => write!(f, "cannot remove the last row of table {id}"),
            Self::LastTableColumn(id) => {
                write!(f, "cannot remove the last column of table {id}")
            }
            Self::CellOutOfRange {
                block_id,
                row,
                column,
            } => write!(f, "cell ({row}, {column}) is outside table {block_id}"),
            Self::ReservedPropertyKey(key) => {
                write!(f, "property key `{key}` is reserved for typed block properties")
            }
            Self::CycleDetected { page_id, parent_id } => write!(
                f,
                "move would create cycle: page {page_id} under parent {parent_id}"
            ),
        }
    }
}

impl Error for StoreError {}

/// Single property edit applied through [`PageStore::set_block_property`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockProperty {
    Checked(bool),
    /// `None` or empty resets to the default color.
    Color(Option<String>),
    Align(Option<Alignment>),
    Language(Option<String>),
    TableCell {
        row: usize,
        column: usize,
        value: String,
    },
    /// Free-form key; `None` removes it.
    Custom { key: String, value: Option<Value> },
}

const RESERVED_PROPERTY_KEYS: [&str; 5] = ["checked", "color", "align", "tableData", "language"];

/// In-memory owner of the page forest.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStore {
    pages: Vec<Page>,
    default_title: String,
    default_icon: String,
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore {
    /// Creates an empty store with built-in page defaults.
    pub fn new() -> Self {
        Self::with_defaults(DEFAULT_PAGE_TITLE, DEFAULT_PAGE_ICON)
    }

    /// Creates an empty store with custom title/icon placeholders.
    pub fn with_defaults(title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            pages: Vec::new(),
            default_title: normalize_title(title.into(), DEFAULT_PAGE_TITLE),
            default_icon: icon.into(),
        }
    }

    /// Rebuilds a store from persisted pages, repairing invariant violations.
    ///
    /// Broken `parentId` links (dangling or cyclic) are detached to root.
    pub fn from_pages(pages: Vec<Page>) -> Self {
        let mut store = Self::new();
        store.replace_pages(pages);
        store
    }

    /// Swaps the whole forest, repairing invariant violations.
    pub(crate) fn replace_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
        self.repair();
    }

    fn repair(&mut self) {
        let mut repaired = 0usize;
        for page in &mut self.pages {
            if page.repair(&self.default_title, &self.default_icon) {
                repaired += 1;
            }
        }
        let mut seen = HashSet::new();
        self.pages.retain(|page| seen.insert(page.id.clone()));

        let broken = forest::broken_parent_links(&self.pages);
        for page in &mut self.pages {
            if broken.contains(&page.id) {
                page.parent_id = None;
                repaired += 1;
            }
        }
        if repaired > 0 {
            warn!(
                "event=store_repair module=store status=repaired pages={}",
                repaired
            );
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        forest::find(&self.pages, page_id)
    }

    pub fn contains(&self, page_id: &str) -> bool {
        self.page(page_id).is_some()
    }

    /// Deep copy of the forest, used for history snapshots.
    pub fn snapshot(&self) -> Vec<Page> {
        self.pages.clone()
    }

    fn page_mut(&mut self, page_id: &str) -> StoreResult<&mut Page> {
        self.pages
            .iter_mut()
            .find(|page| page.id == page_id)
            .ok_or_else(|| StoreError::PageNotFound(page_id.to_string()))
    }

    fn block_mut(&mut self, page_id: &str, block_id: &str) -> StoreResult<&mut Block> {
        let page = self.page_mut(page_id)?;
        page.block_mut(block_id)
            .ok_or_else(|| StoreError::BlockNotFound {
                page_id: page_id.to_string(),
                block_id: block_id.to_string(),
            })
    }

    fn touch(&mut self, page_id: &str) {
        if let Ok(page) = self.page_mut(page_id) {
            page.touch();
        }
    }

    fn default_page(&self, parent_id: Option<PageId>) -> Page {
        let mut page = Page::new(self.default_title.clone(), parent_id);
        page.icon = self.default_icon.clone();
        page
    }

    /// Creates a page with one empty `text` block.
    ///
    /// Root pages go to the front; child pages are appended and expand
    /// their parent.
    pub fn create_page(&mut self, parent_id: Option<&str>) -> StoreResult<&Page> {
        match parent_id {
            None => {
                let page = self.default_page(None);
                self.pages.insert(0, page);
                Ok(&self.pages[0])
            }
            Some(parent_id) => {
                let parent = self.page_mut(parent_id)?;
                parent.expanded = true;
                let page = self.default_page(Some(parent_id.to_string()));
                self.pages.push(page);
                Ok(&self.pages[self.pages.len() - 1])
            }
        }
    }

    /// Creates a root page over pre-built blocks (markdown import).
    ///
    /// An empty block list yields one empty `text` block.
    pub fn create_page_with_blocks(
        &mut self,
        title: impl Into<String>,
        blocks: Vec<Block>,
    ) -> &Page {
        let mut page = Page::with_blocks(
            normalize_title(title.into(), &self.default_title),
            None,
            blocks,
        );
        page.icon = self.default_icon.clone();
        page.repair(&self.default_title, &self.default_icon);
        self.pages.insert(0, page);
        &self.pages[0]
    }

    /// Deletes `page_id` and its whole descendant closure.
    ///
    /// Returns the removed ids, target first.
    pub fn delete_page(&mut self, page_id: &str) -> StoreResult<Vec<PageId>> {
        let closure = forest::descendant_closure(&self.pages, page_id);
        if closure.is_empty() {
            return Err(StoreError::PageNotFound(page_id.to_string()));
        }
        self.pages.retain(|page| !closure.contains(&page.id));
        Ok(closure)
    }

    /// Sets the title; blank input falls back to the placeholder title.
    pub fn set_page_title(&mut self, page_id: &str, title: impl Into<String>) -> StoreResult<()> {
        let title = normalize_title(title.into(), &self.default_title);
        let page = self.page_mut(page_id)?;
        page.title = title;
        page.touch();
        Ok(())
    }

    /// Sets the icon; empty input restores the default glyph.
    pub fn set_page_icon(&mut self, page_id: &str, icon: impl Into<String>) -> StoreResult<()> {
        let icon = icon.into();
        let icon = if icon.trim().is_empty() {
            self.default_icon.clone()
        } else {
            icon
        };
        let page = self.page_mut(page_id)?;
        page.icon = icon;
        page.touch();
        Ok(())
    }

    pub fn set_expanded(&mut self, page_id: &str, expanded: bool) -> StoreResult<()> {
        self.page_mut(page_id)?.expanded = expanded;
        Ok(())
    }

    /// Flips `expanded` and returns the new value.
    pub fn toggle_expanded(&mut self, page_id: &str) -> StoreResult<bool> {
        let page = self.page_mut(page_id)?;
        page.expanded = !page.expanded;
        Ok(page.expanded)
    }

    /// Sets (or with `None`, removes) one opaque page metadata entry.
    pub fn set_page_property(
        &mut self,
        page_id: &str,
        key: impl Into<String>,
        value: Option<Value>,
    ) -> StoreResult<()> {
        let key = key.into();
        let page = self.page_mut(page_id)?;
        match value {
            Some(value) => {
                page.properties.insert(key, value);
            }
            None => {
                page.properties.remove(&key);
            }
        }
        page.touch();
        Ok(())
    }

    /// Re-parents a page and places it among its new siblings.
    ///
    /// `target_index` is clamped to the sibling count; `None` appends.
    pub fn move_page(
        &mut self,
        page_id: &str,
        new_parent_id: Option<&str>,
        target_index: Option<usize>,
    ) -> StoreResult<()> {
        let position = self
            .pages
            .iter()
            .position(|page| page.id == page_id)
            .ok_or_else(|| StoreError::PageNotFound(page_id.to_string()))?;

        if let Some(parent_id) = new_parent_id {
            if !self.contains(parent_id) {
                return Err(StoreError::PageNotFound(parent_id.to_string()));
            }
            if forest::would_create_cycle(&self.pages, page_id, parent_id) {
                return Err(StoreError::CycleDetected {
                    page_id: page_id.to_string(),
                    parent_id: parent_id.to_string(),
                });
            }
        }

        let mut page = self.pages.remove(position);
        page.parent_id = new_parent_id.map(str::to_string);
        page.touch();

        let siblings: Vec<usize> = self
            .pages
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.parent_id.as_deref() == new_parent_id)
            .map(|(index, _)| index)
            .collect();
        let slot = target_index
            .unwrap_or(siblings.len())
            .min(siblings.len());
        let insert_at = match siblings.get(slot) {
            Some(&index) => index,
            None => siblings.last().map_or(self.pages.len(), |&last| last + 1),
        };
        self.pages.insert(insert_at, page);

        if let Some(parent_id) = new_parent_id {
            self.page_mut(parent_id)?.expanded = true;
        }
        Ok(())
    }

    /// Moves a block to `new_index`, clamped to `[0, len-1]`.
    ///
    /// Returns the final index.
    pub fn move_block(
        &mut self,
        page_id: &str,
        block_id: &str,
        new_index: usize,
    ) -> StoreResult<usize> {
        let page = self.page_mut(page_id)?;
        let from = page
            .block_index(block_id)
            .ok_or_else(|| StoreError::BlockNotFound {
                page_id: page_id.to_string(),
                block_id: block_id.to_string(),
            })?;
        let block = page.blocks.remove(from);
        let to = new_index.min(page.blocks.len());
        page.blocks.insert(to, block);
        page.touch();
        Ok(to)
    }

    /// Inserts an empty `text` block right after `index`.
    ///
    /// An `index` past the end appends.
    pub fn insert_block_after(&mut self, page_id: &str, index: usize) -> StoreResult<&Block> {
        let page = self.page_mut(page_id)?;
        let at = index.saturating_add(1).min(page.blocks.len());
        page.blocks.insert(at, Block::empty_text());
        page.touch();
        Ok(&page.blocks[at])
    }

    /// Deletes a block and returns the index that should receive focus.
    ///
    /// The last remaining block of a page cannot be deleted.
    pub fn delete_block(&mut self, page_id: &str, block_id: &str) -> StoreResult<usize> {
        let page = self.page_mut(page_id)?;
        let index = page
            .block_index(block_id)
            .ok_or_else(|| StoreError::BlockNotFound {
                page_id: page_id.to_string(),
                block_id: block_id.to_string(),
            })?;
        if page.blocks.len() <= 1 {
            return Err(StoreError::LastBlock(page_id.to_string()));
        }
        page.blocks.remove(index);
        page.touch();
        Ok(index.saturating_sub(1))
    }

    pub fn set_block_type(
        &mut self,
        page_id: &str,
        block_id: &str,
        kind: BlockType,
    ) -> StoreResult<()> {
        self.block_mut(page_id, block_id)?.change_type(kind);
        self.touch(page_id);
        Ok(())
    }

    /// Replaces block text. Returns whether anything changed.
    ///
    /// `divider` and `table` blocks carry no text; content sent to them is
    /// ignored and the page is left untouched.
    pub fn set_block_content(
        &mut self,
        page_id: &str,
        block_id: &str,
        content: impl Into<String>,
    ) -> StoreResult<bool> {
        let block = self.block_mut(page_id, block_id)?;
        let content = content.into();
        if !block.kind.has_content() || block.content == content {
            return Ok(false);
        }
        block.content = content;
        self.touch(page_id);
        Ok(true)
    }

    pub fn set_block_property(
        &mut self,
        page_id: &str,
        block_id: &str,
        property: BlockProperty,
    ) -> StoreResult<()> {
        if let BlockProperty::Custom { key, .. } = &property {
            if RESERVED_PROPERTY_KEYS.contains(&key.as_str()) {
                return Err(StoreError::ReservedPropertyKey(key.clone()));
            }
        }

        let block = self.block_mut(page_id, block_id)?;
        match property {
            BlockProperty::Checked(checked) => block.properties.checked = Some(checked),
            BlockProperty::Color(color) => {
                block.properties.color = color.filter(|value| !value.trim().is_empty());
            }
            BlockProperty::Align(align) => block.properties.align = align,
            BlockProperty::Language(language) => {
                block.properties.language = language.filter(|value| !value.trim().is_empty());
            }
            BlockProperty::TableCell { row, column, value } => {
                let id = block.id.clone();
                let table = block
                    .table_data_mut()
                    .ok_or_else(|| StoreError::NotATable(id.clone()))?;
                if !table.set_cell(row, column, value) {
                    return Err(StoreError::CellOutOfRange {
                        block_id: id,
                        row,
                        column,
                    });
                }
            }
            BlockProperty::Custom { key, value } => match value {
                Some(value) => {
                    block.properties.extra.insert(key, value);
                }
                None => {
                    block.properties.extra.remove(&key);
                }
            },
        }
        self.touch(page_id);
        Ok(())
    }

    fn edit_table<F>(&mut self, page_id: &str, block_id: &str, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut TableData, &BlockId) -> StoreResult<()>,
    {
        let block = self.block_mut(page_id, block_id)?;
        let id = block.id.clone();
        let table = block
            .table_data_mut()
            .ok_or_else(|| StoreError::NotATable(id.clone()))?;
        edit(table, &id)?;
        self.touch(page_id);
        Ok(())
    }

    pub fn add_table_row(&mut self, page_id: &str, block_id: &str) -> StoreResult<()> {
        self.edit_table(page_id, block_id, |table, _| {
            table.add_row();
            Ok(())
        })
    }

    /// Removes the last row; refused on a single-row table.
    pub fn remove_table_row(&mut self, page_id: &str, block_id: &str) -> StoreResult<()> {
        self.edit_table(page_id, block_id, |table, id| {
            if table.remove_row() {
                Ok(())
            } else {
                Err(StoreError::LastTableRow(id.clone()))
            }
        })
    }

    pub fn add_table_column(&mut self, page_id: &str, block_id: &str) -> StoreResult<()> {
        self.edit_table(page_id, block_id, |table, _| {
            table.add_column();
            Ok(())
        })
    }

    /// Removes the last column; refused on a single-column table.
    pub fn remove_table_column(&mut self, page_id: &str, block_id: &str) -> StoreResult<()> {
        self.edit_table(page_id, block_id, |table, id| {
            if table.remove_column() {
                Ok(())
            } else {
                Err(StoreError::LastTableColumn(id.clone()))
            }
        })
    }

    pub fn root_pages(&self) -> Vec<&Page> {
        forest::root_pages(&self.pages)
    }

    pub fn children_of(&self, page_id: &str) -> Vec<&Page> {
        forest::children_of(&self.pages, page_id)
    }

    /// Ancestors of `page_id`, parent first.
    pub fn ancestor_chain(&self, page_id: &str) -> Vec<&Page> {
        forest::ancestor_chain(&self.pages, page_id)
    }

    /// Root-to-page path including the page itself.
    pub fn breadcrumbs(&self, page_id: &str) -> Vec<&Page> {
        forest::breadcrumbs(&self.pages, page_id)
    }

    /// Transitive children of `page_id`, excluding the page itself.
    pub fn descendant_ids(&self, page_id: &str) -> Vec<PageId> {
        forest::descendant_closure(&self.pages, page_id)
            .into_iter()
            .skip(1)
            .collect()
    }
}
