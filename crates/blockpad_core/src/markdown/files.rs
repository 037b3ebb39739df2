//! File naming rules for markdown import/export.

use crate::model::page::DEFAULT_PAGE_TITLE;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid file name regex"));

/// Export file name for a page title: every non-alphanumeric character
/// becomes `-`, the rest is lower-cased, and `.md` is appended.
pub fn export_file_name(title: &str) -> String {
    let stem = NON_ALNUM_RE.replace_all(title, "-").to_lowercase();
    if stem.is_empty() {
        return format!("{}.md", DEFAULT_PAGE_TITLE.to_lowercase());
    }
    format!("{stem}.md")
}

/// Page title for an imported file: the file name without directory or
/// extension.
pub fn import_title(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::trim)
        .unwrap_or_default();
    if stem.is_empty() {
        return DEFAULT_PAGE_TITLE.to_string();
    }
    stem.to_string()
}
