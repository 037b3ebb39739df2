//! Workspace configuration.
//!
//! Defaults mirror the persisted-data conventions: 50 history snapshots,
//! `Untitled` pages with the generic document glyph.

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::model::page::{DEFAULT_PAGE_ICON, DEFAULT_PAGE_TITLE};

/// Blob key holding the JSON page array.
pub const PAGES_KEY: &str = "pages";

/// Blob key holding the JSON `{ history, index }` document.
pub const HISTORY_KEY: &str = "history";

/// Tunables for a [`crate::Workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    /// Maximum retained undo snapshots.
    pub history_limit: usize,
    /// Title given to new pages and to pages whose title is cleared.
    pub default_page_title: String,
    /// Icon given to new pages and to pages whose icon is cleared.
    pub default_page_icon: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_page_title: DEFAULT_PAGE_TITLE.to_string(),
            default_page_icon: DEFAULT_PAGE_ICON.to_string(),
        }
    }
}
