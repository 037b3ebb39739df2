//! Core of the Blockpad block editor.
//! Owns the page forest, undo history, markdown codec and persistence;
//! front-ends only render state and forward edits.

pub mod config;
pub mod db;
pub mod history;
pub mod logging;
pub mod markdown;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::WorkspaceConfig;
pub use history::{HistoryManager, PersistedHistory, Restored, Snapshot, DEFAULT_HISTORY_LIMIT};
pub use logging::{
    default_log_level, init_cli_logging, init_logging, logging_status, LogTarget, LoggingError,
};
pub use model::block::{
    Alignment, Block, BlockId, BlockProperties, BlockType, BlockValidationError, TableData,
};
pub use model::page::{Page, PageId};
pub use repo::blob_repo::{BlobStore, MemoryBlobStore, RepoError, RepoResult, SqliteBlobStore};
pub use service::workspace::{MarkdownExport, Workspace, WorkspaceError, WorkspaceResult};
pub use store::page_store::{BlockProperty, PageStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
