//! Workspace use-case service.
//!
//! # Responsibility
//! - Own the page store, the undo history and the current-page pointer.
//! - Record one history snapshot per successful mutation, labelled with a
//!   human-readable description.
//! - Write `pages` and `history` through to the blob store after each
//!   change.
//!
//! # Invariants
//! - A rejected store operation records nothing and writes nothing.
//! - Malformed persisted JSON loads as empty state instead of failing.
//! - A page that fails to decode is skipped; its siblings still load.
//! - `current_page_id`, when set, always names an existing page.

use crate::config::{WorkspaceConfig, HISTORY_KEY, PAGES_KEY};
use crate::history::{HistoryManager, PersistedHistory, Restored};
use crate::markdown;
use crate::model::block::{Block, BlockId, BlockType};
use crate::model::page::{Page, PageId};
use crate::repo::blob_repo::{BlobStore, RepoError};
use crate::store::page_store::{BlockProperty, PageStore, StoreError, StoreResult};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Errors from workspace operations.
#[derive(Debug)]
pub enum WorkspaceError {
    /// The store refused the operation; nothing changed.
    Store(StoreError),
    /// Blob store read/write failure.
    Repo(RepoError),
    /// State could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode workspace state: {err}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<StoreError> for WorkspaceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for WorkspaceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for WorkspaceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Markdown export payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownExport {
    /// Sanitized `<title>.md` file name.
    pub file_name: String,
    pub content: String,
}

/// UI-facing facade over page store, history and persistence.
pub struct Workspace<S: BlobStore> {
    blobs: S,
    store: PageStore,
    history: HistoryManager,
    current_page_id: Option<PageId>,
}

impl<S: BlobStore> Workspace<S> {
    /// Loads a workspace with default configuration.
    pub fn open(blobs: S) -> WorkspaceResult<Self> {
        Self::open_with_config(blobs, WorkspaceConfig::default())
    }

    /// Loads persisted pages and history from `blobs`.
    ///
    /// The first root page becomes current. An empty history is seeded with
    /// an `Initial state` snapshot so the first mutation can be undone.
    pub fn open_with_config(blobs: S, config: WorkspaceConfig) -> WorkspaceResult<Self> {
        let pages = load_pages(&blobs)?;
        let persisted_history: Option<PersistedHistory> = load_json(&blobs, HISTORY_KEY)?;

        let mut store =
            PageStore::with_defaults(config.default_page_title, config.default_page_icon);
        store.replace_pages(pages);

        let mut history = match persisted_history {
            Some(persisted) => HistoryManager::from_persisted(persisted, config.history_limit),
            None => HistoryManager::with_limit(config.history_limit),
        };

        let current_page_id = store.root_pages().first().map(|page| page.id.clone());
        if history.is_empty() {
            history.record(&store, current_page_id.as_deref(), "Initial state");
        }

        info!(
            "event=workspace_open module=service status=ok pages={} history_entries={}",
            store.len(),
            history.entries().len()
        );

        Ok(Self {
            blobs,
            store,
            history,
            current_page_id,
        })
    }

    pub fn store(&self) -> &PageStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn blobs(&self) -> &S {
        &self.blobs
    }

    pub fn current_page_id(&self) -> Option<&str> {
        self.current_page_id.as_deref()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current_page_id
            .as_deref()
            .and_then(|page_id| self.store.page(page_id))
    }

    /// Makes `page_id` current. Selection is not an undoable step.
    pub fn select_page(&mut self, page_id: &str) -> WorkspaceResult<()> {
        if !self.store.contains(page_id) {
            return Err(StoreError::PageNotFound(page_id.to_string()).into());
        }
        self.current_page_id = Some(page_id.to_string());
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Creates a root page (or a child of `parent_id`) and makes it current.
    pub fn create_page(&mut self, parent_id: Option<&str>) -> WorkspaceResult<PageId> {
        let description = if parent_id.is_some() {
            "Create child page"
        } else {
            "Create page"
        };
        let page_id = self.store.create_page(parent_id)?.id.clone();
        self.current_page_id = Some(page_id.clone());
        self.commit(description)?;
        Ok(page_id)
    }

    /// Deletes a page with all descendants. Returns the removed ids.
    ///
    /// When the current page is removed, the first remaining root page
    /// becomes current.
    pub fn delete_page(&mut self, page_id: &str) -> WorkspaceResult<Vec<PageId>> {
        let title = self.page_title(page_id)?;
        let removed = self.store.delete_page(page_id)?;
        if self
            .current_page_id
            .as_ref()
            .is_some_and(|current| removed.contains(current))
        {
            self.current_page_id = self.store.root_pages().first().map(|page| page.id.clone());
        }
        self.commit(&format!("Delete page \"{title}\""))?;
        Ok(removed)
    }

    pub fn set_page_title(&mut self, page_id: &str, title: &str) -> WorkspaceResult<()> {
        self.apply("Rename page", |store| store.set_page_title(page_id, title))
    }

    pub fn set_page_icon(&mut self, page_id: &str, icon: &str) -> WorkspaceResult<()> {
        self.apply("Change page icon", |store| store.set_page_icon(page_id, icon))
    }

    pub fn set_page_property(
        &mut self,
        page_id: &str,
        key: &str,
        value: Option<Value>,
    ) -> WorkspaceResult<()> {
        self.apply("Change page property", |store| {
            store.set_page_property(page_id, key, value)
        })
    }

    /// Flips the sidebar expansion hint. Persisted, not undoable.
    pub fn toggle_expanded(&mut self, page_id: &str) -> WorkspaceResult<bool> {
        let expanded = self.store.toggle_expanded(page_id)?;
        self.persist()?;
        Ok(expanded)
    }

    pub fn move_page(
        &mut self,
        page_id: &str,
        new_parent_id: Option<&str>,
        target_index: Option<usize>,
    ) -> WorkspaceResult<()> {
        self.apply("Move page", |store| {
            store.move_page(page_id, new_parent_id, target_index)
        })
    }

    pub fn insert_block_after(&mut self, page_id: &str, index: usize) -> WorkspaceResult<BlockId> {
        self.apply("Add block", |store| {
            store
                .insert_block_after(page_id, index)
                .map(|block| block.id.clone())
        })
    }

    /// Deletes a block and returns the index that should receive focus.
    pub fn delete_block(&mut self, page_id: &str, block_id: &str) -> WorkspaceResult<usize> {
        self.apply("Delete block", |store| store.delete_block(page_id, block_id))
    }

    pub fn move_block(
        &mut self,
        page_id: &str,
        block_id: &str,
        new_index: usize,
    ) -> WorkspaceResult<usize> {
        self.apply("Move block", |store| {
            store.move_block(page_id, block_id, new_index)
        })
    }

    pub fn set_block_type(
        &mut self,
        page_id: &str,
        block_id: &str,
        kind: BlockType,
    ) -> WorkspaceResult<()> {
        let description = format!("Change block to {kind}");
        self.apply(&description, |store| {
            store.set_block_type(page_id, block_id, kind)
        })
    }

    pub fn set_block_content(
        &mut self,
        page_id: &str,
        block_id: &str,
        content: &str,
    ) -> WorkspaceResult<()> {
        if self.store.set_block_content(page_id, block_id, content)? {
            self.commit("Edit block")?;
        }
        Ok(())
    }

    pub fn set_block_property(
        &mut self,
        page_id: &str,
        block_id: &str,
        property: BlockProperty,
    ) -> WorkspaceResult<()> {
        let description = match &property {
            BlockProperty::Checked(true) => "Check todo",
            BlockProperty::Checked(false) => "Uncheck todo",
            BlockProperty::Color(_) => "Change block color",
            BlockProperty::Align(_) => "Change block alignment",
            BlockProperty::Language(_) => "Change code language",
            BlockProperty::TableCell { .. } => "Edit table cell",
            BlockProperty::Custom { .. } => "Change block property",
        };
        self.apply(description, |store| {
            store.set_block_property(page_id, block_id, property)
        })
    }

    pub fn add_table_row(&mut self, page_id: &str, block_id: &str) -> WorkspaceResult<()> {
        self.apply("Add table row", |store| store.add_table_row(page_id, block_id))
    }

    pub fn remove_table_row(&mut self, page_id: &str, block_id: &str) -> WorkspaceResult<()> {
        self.apply("Remove table row", |store| {
            store.remove_table_row(page_id, block_id)
        })
    }

    pub fn add_table_column(&mut self, page_id: &str, block_id: &str) -> WorkspaceResult<()> {
        self.apply("Add table column", |store| {
            store.add_table_column(page_id, block_id)
        })
    }

    pub fn remove_table_column(&mut self, page_id: &str, block_id: &str) -> WorkspaceResult<()> {
        self.apply("Remove table column", |store| {
            store.remove_table_column(page_id, block_id)
        })
    }

    /// Imports a markdown file as a new current root page.
    ///
    /// The page is titled from `file_name`; unparseable or empty input
    /// yields a single empty `text` block.
    pub fn import_markdown(&mut self, file_name: &str, contents: &str) -> WorkspaceResult<PageId> {
        let title = markdown::import_title(file_name);
        let blocks: Vec<Block> = markdown::parse_for_import(contents);
        let block_count = blocks.len();
        let page_id = self.store.create_page_with_blocks(title.clone(), blocks).id.clone();
        self.current_page_id = Some(page_id.clone());
        self.commit(&format!("Import \"{title}\""))?;
        info!(
            "event=markdown_import module=service status=ok blocks={}",
            block_count
        );
        Ok(page_id)
    }

    /// Serializes one page for download. `None` when the page is unknown.
    pub fn export_markdown(&self, page_id: &str) -> Option<MarkdownExport> {
        let page = self.store.page(page_id)?;
        Some(MarkdownExport {
            file_name: markdown::export_file_name(&page.title),
            content: markdown::serialize(page),
        })
    }

    /// Reverts the latest step. `Ok(None)` when there is nothing to undo.
    pub fn undo(&mut self) -> WorkspaceResult<Option<Restored>> {
        let Some(restored) = self.history.undo(&mut self.store) else {
            return Ok(None);
        };
        self.current_page_id = restored.current_page_id.clone();
        self.persist()?;
        Ok(Some(restored))
    }

    /// Re-applies the latest undone step. `Ok(None)` when there is nothing to redo.
    pub fn redo(&mut self) -> WorkspaceResult<Option<Restored>> {
        let Some(restored) = self.history.redo(&mut self.store) else {
            return Ok(None);
        };
        self.current_page_id = restored.current_page_id.clone();
        self.persist()?;
        Ok(Some(restored))
    }

    fn page_title(&self, page_id: &str) -> StoreResult<String> {
        self.store
            .page(page_id)
            .map(|page| page.title.clone())
            .ok_or_else(|| StoreError::PageNotFound(page_id.to_string()))
    }

    fn apply<T, F>(&mut self, description: &str, op: F) -> WorkspaceResult<T>
    where
        F: FnOnce(&mut PageStore) -> StoreResult<T>,
    {
        let value = op(&mut self.store)?;
        self.commit(description)?;
        Ok(value)
    }

    fn commit(&mut self, description: &str) -> WorkspaceResult<()> {
        self.history
            .record(&self.store, self.current_page_id.as_deref(), description);
        debug!(
            "event=workspace_commit module=service status=ok description={:?}",
            description
        );
        self.persist()
    }

    fn persist(&self) -> WorkspaceResult<()> {
        let pages = serde_json::to_string(self.store.pages())?;
        let history = serde_json::to_string(&self.history.to_persisted())?;
        self.blobs.put(PAGES_KEY, &pages)?;
        self.blobs.put(HISTORY_KEY, &history)?;
        Ok(())
    }
}

/// Decodes the `pages` blob page by page, skipping pages that do not fit
/// the model.
fn load_pages(blobs: &impl BlobStore) -> WorkspaceResult<Vec<Page>> {
    let Some(raw_pages) = load_json::<Vec<Value>>(blobs, PAGES_KEY)? else {
        return Ok(Vec::new());
    };
    let mut pages = Vec::with_capacity(raw_pages.len());
    for (index, raw) in raw_pages.into_iter().enumerate() {
        match serde_json::from_value::<Page>(raw) {
            Ok(page) => pages.push(page),
            Err(err) => warn!(
                "event=workspace_load module=service status=skipped key={} page_index={} error={}",
                PAGES_KEY, index, err
            ),
        }
    }
    Ok(pages)
}

/// Reads and decodes one blob. Malformed JSON is logged and treated as absent.
fn load_json<T: DeserializeOwned>(blobs: &impl BlobStore, key: &str) -> WorkspaceResult<Option<T>> {
    let Some(raw) = blobs.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(
                "event=workspace_load module=service status=degraded key={} error={}",
                key, err
            );
            Ok(None)
        }
    }
}
