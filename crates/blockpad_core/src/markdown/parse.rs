//! Line-oriented markdown to block parser.
//!
//! # Invariants
//! - Parsing is total: every non-blank line outside a fence or table lands
//!   in some block, falling back to `text`.
//! - Inside a code fence lines are copied verbatim and no other rule runs.
//! - An unterminated fence at end of input still yields a `code` block.

use crate::model::block::{Block, BlockType, TableData};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+\. ").expect("valid numbered item regex"));
static TABLE_SEPARATOR_CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:?-+:?$").expect("valid table separator regex"));

pub(crate) const FENCE: &str = "```";

/// Parses markdown text into blocks.
pub fn parse(text: &str) -> Vec<Block> {
    let mut parser = LineParser::default();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

#[derive(Default)]
struct LineParser {
    blocks: Vec<Block>,
    inside_code_fence: bool,
    code_buffer: Vec<String>,
    code_language: Option<String>,
    table_rows: Vec<Vec<String>>,
    pending_header: Option<PendingHeader>,
}

/// Pipe row that opens a table only if a separator row follows.
struct PendingHeader {
    line: String,
    cells: Vec<String>,
}

impl LineParser {
    fn feed(&mut self, line: &str) {
        if let Some(info) = line.trim_start().strip_prefix(FENCE) {
            if self.inside_code_fence {
                self.flush_code();
            } else {
                self.flush_table();
                self.flush_pending_header();
                self.inside_code_fence = true;
                let info = info.trim();
                self.code_language = (!info.is_empty()).then(|| info.to_string());
            }
            return;
        }

        if self.inside_code_fence {
            self.code_buffer.push(line.to_string());
            return;
        }

        if let Some(header) = self.pending_header.take() {
            if is_separator_row(line) {
                self.table_rows.push(header.cells);
                return;
            }
            self.blocks.push(classify_line(&header.line));
        }

        if let Some(cells) = table_row_cells(line) {
            if self.table_rows.is_empty() {
                self.pending_header = Some(PendingHeader {
                    line: line.to_string(),
                    cells,
                });
            } else {
                self.table_rows.push(cells);
            }
            return;
        }
        self.flush_table();

        if line.trim().is_empty() {
            return;
        }

        self.blocks.push(classify_line(line));
    }

    /// A pipe row never confirmed by a separator row is ordinary text.
    fn flush_pending_header(&mut self) {
        if let Some(header) = self.pending_header.take() {
            self.blocks.push(classify_line(&header.line));
        }
    }

    fn flush_code(&mut self) {
        let content = self.code_buffer.join("\n");
        let mut block = Block::new(BlockType::Code, content);
        block.properties.language = self.code_language.take();
        self.blocks.push(block);
        self.code_buffer.clear();
        self.inside_code_fence = false;
    }

    fn flush_table(&mut self) {
        if self.table_rows.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.table_rows);
        self.blocks.push(Block::table(TableData::from_rows(rows)));
    }

    fn finish(mut self) -> Vec<Block> {
        if self.inside_code_fence {
            self.flush_code();
        }
        self.flush_table();
        self.flush_pending_header();
        self.blocks
    }
}

/// Maps one non-blank line outside fences/tables to a block.
fn classify_line(line: &str) -> Block {
    if line == "---" {
        return Block::new(BlockType::Divider, "");
    }

    for (prefix, kind) in [
        ("### ", BlockType::Heading3),
        ("## ", BlockType::Heading2),
        ("# ", BlockType::Heading1),
    ] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Block::new(kind, rest);
        }
    }

    if let Some((checked, rest)) = todo_item(line) {
        return Block::todo(rest, checked);
    }

    if let Some(rest) = line.strip_prefix("- ") {
        return Block::new(BlockType::BulletedList, rest);
    }

    if let Some(found) = NUMBERED_ITEM_RE.find(line) {
        return Block::new(BlockType::NumberedList, &line[found.end()..]);
    }

    if let Some(rest) = line.strip_prefix("> ") {
        return Block::new(BlockType::Quote, rest);
    }

    Block::new(BlockType::Text, line)
}

/// Recognizes `- [ ] `, `- [x] ` and `- [X] ` items. The trailing space is
/// part of the marker.
fn todo_item(line: &str) -> Option<(bool, &str)> {
    let rest = line.strip_prefix("- [")?;
    let mut chars = rest.chars();
    let checked = match chars.next()? {
        ' ' => false,
        'x' | 'X' => true,
        _ => return None,
    };
    chars
        .as_str()
        .strip_prefix("] ")
        .map(|content| (checked, content))
}

/// Whether `line` is a `| --- | :-: |` header separator.
fn is_separator_row(line: &str) -> bool {
    table_row_cells(line).is_some_and(|cells| {
        cells
            .iter()
            .all(|cell| TABLE_SEPARATOR_CELL_RE.is_match(cell))
    })
}

/// Splits a `| a | b |` line into trimmed, unescaped cells.
fn table_row_cells(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return None;
    }
    if trimmed.ends_with("\\|") && !trimmed.ends_with("\\\\|") {
        return None;
    }
    let inner = &trimmed[1..trimmed.len() - 1];

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            other => current.push(other),
        }
    }
    cells.push(current.trim().to_string());
    Some(cells)
}
