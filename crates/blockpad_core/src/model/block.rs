//! Block domain model.
//!
//! # Responsibility
//! - Define the atomic typed content unit owned by a page.
//! - Own per-variant property semantics (`checked`, `color`, `align`,
//!   `tableData`, `language`).
//!
//! # Invariants
//! - `id` is non-empty and stable for the block lifetime.
//! - `divider` and `table` blocks carry empty `content`.
//! - `tableData` is rectangular with at least one row and one column.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque block identifier, unique within its owning page.
pub type BlockId = String;

/// Closed set of block variants.
///
/// Wire names match the persisted `type` field (`bulletedList`, `heading1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockType {
    Text,
    Heading1,
    Heading2,
    Heading3,
    Todo,
    BulletedList,
    NumberedList,
    Code,
    Quote,
    Divider,
    Table,
}

impl BlockType {
    /// Every variant, in menu order.
    pub const ALL: [BlockType; 11] = [
        BlockType::Text,
        BlockType::Heading1,
        BlockType::Heading2,
        BlockType::Heading3,
        BlockType::Todo,
        BlockType::BulletedList,
        BlockType::NumberedList,
        BlockType::Code,
        BlockType::Quote,
        BlockType::Divider,
        BlockType::Table,
    ];

    /// Stable wire name of this variant.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading1 => "heading1",
            Self::Heading2 => "heading2",
            Self::Heading3 => "heading3",
            Self::Todo => "todo",
            Self::BulletedList => "bulletedList",
            Self::NumberedList => "numberedList",
            Self::Code => "code",
            Self::Quote => "quote",
            Self::Divider => "divider",
            Self::Table => "table",
        }
    }

    /// Parses a wire name back into a variant.
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Whether this variant carries a text payload.
    pub fn has_content(self) -> bool {
        !matches!(self, Self::Divider | Self::Table)
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal alignment hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Rectangular grid of cell strings. Row 0 is the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableData(Vec<Vec<String>>);

impl TableData {
    /// Creates a `rows` x `columns` grid of empty cells (each at least 1).
    pub fn empty(rows: usize, columns: usize) -> Self {
        let columns = columns.max(1);
        Self(vec![vec![String::new(); columns]; rows.max(1)])
    }

    /// Builds a grid from raw rows, padding short rows with empty cells.
    ///
    /// An empty input yields a single 1x1 grid.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        let mut table = Self(rows);
        table.normalize();
        table
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.0
    }

    pub fn row_count(&self) -> usize {
        self.0.len()
    }

    pub fn column_count(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.0.get(row)?.get(column).map(String::as_str)
    }

    /// Overwrites one cell. Returns `false` when out of range.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> bool {
        match self.0.get_mut(row).and_then(|cells| cells.get_mut(column)) {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    /// Appends one empty row matching the current column count.
    pub fn add_row(&mut self) {
        let columns = self.column_count().max(1);
        self.0.push(vec![String::new(); columns]);
    }

    /// Removes the last row. Refused (returns `false`) on a single-row table.
    pub fn remove_row(&mut self) -> bool {
        if self.0.len() <= 1 {
            return false;
        }
        self.0.pop();
        true
    }

    /// Appends one empty cell to every row.
    pub fn add_column(&mut self) {
        for row in &mut self.0 {
            row.push(String::new());
        }
    }

    /// Removes the last cell of every row. Refused on a single-column table.
    pub fn remove_column(&mut self) -> bool {
        if self.column_count() <= 1 {
            return false;
        }
        for row in &mut self.0 {
            row.pop();
        }
        true
    }

    /// Checks shape invariants without repairing.
    pub fn validate(&self) -> Result<(), BlockValidationError> {
        let columns = self.column_count();
        if self.0.is_empty() || columns == 0 {
            return Err(BlockValidationError::EmptyTable);
        }
        for (index, row) in self.0.iter().enumerate() {
            if row.len() != columns {
                return Err(BlockValidationError::RaggedTable {
                    row: index,
                    expected: columns,
                    actual: row.len(),
                });
            }
        }
        Ok(())
    }

    /// Repairs shape invariants in place. Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        let widest = self.0.iter().map(Vec::len).max().unwrap_or(0).max(1);
        let mut changed = false;
        if self.0.is_empty() {
            self.0.push(Vec::new());
            changed = true;
        }
        for row in &mut self.0 {
            if row.len() < widest {
                row.resize(widest, String::new());
                changed = true;
            }
        }
        changed
    }
}

/// Per-variant block properties.
///
/// Known keys are typed; anything else is kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockProperties {
    /// Meaningful only for `todo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    /// CSS color; `None` or empty means the default color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    /// Meaningful only for `table`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
    /// Code fence info string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Validation errors for block invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockValidationError {
    /// `id` is blank.
    EmptyId,
    /// Table has no rows or no columns.
    EmptyTable,
    /// Table row length differs from the header row.
    RaggedTable {
        row: usize,
        expected: usize,
        actual: usize,
    },
    /// `table` block is missing `tableData`.
    MissingTableData,
}

impl Display for BlockValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "block id must not be empty"),
            Self::EmptyTable => write!(f, "table must have at least one row and one column"),
            Self::RaggedTable {
                row,
                expected,
                actual,
            } => write!(
                f,
                "table row {row} has {actual} cells, expected {expected}"
            ),
            Self::MissingTableData => write!(f, "table block has no tableData"),
        }
    }
}

impl Error for BlockValidationError {}

/// Atomic typed content unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    /// Serialized as `type` to match the persisted schema.
    #[serde(rename = "type")]
    pub kind: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub properties: BlockProperties,
}

impl Block {
    /// Creates a block with a generated id.
    ///
    /// `table` blocks start as a 2x2 empty grid; `todo` blocks start unchecked.
    pub fn new(kind: BlockType, content: impl Into<String>) -> Self {
        let mut block = Self {
            id: generate_block_id(),
            kind: BlockType::Text,
            content: content.into(),
            properties: BlockProperties::default(),
        };
        block.change_type(kind);
        block
    }

    /// Creates a block with a caller-provided id.
    ///
    /// Used by import paths where identity already exists.
    pub fn with_id(
        id: impl Into<BlockId>,
        kind: BlockType,
        content: impl Into<String>,
    ) -> Result<Self, BlockValidationError> {
        let mut block = Self::new(kind, content);
        block.id = id.into();
        block.validate()?;
        Ok(block)
    }

    /// Empty default `text` block.
    pub fn empty_text() -> Self {
        Self::new(BlockType::Text, "")
    }

    /// `todo` block with an explicit check state.
    pub fn todo(content: impl Into<String>, checked: bool) -> Self {
        let mut block = Self::new(BlockType::Todo, content);
        block.properties.checked = Some(checked);
        block
    }

    /// `table` block over the given grid.
    pub fn table(data: TableData) -> Self {
        let mut block = Self::new(BlockType::Table, "");
        block.properties.table_data = Some(data);
        block
    }

    /// Whether a `todo` block is checked. Always `false` for other variants.
    pub fn is_checked(&self) -> bool {
        self.kind == BlockType::Todo && self.properties.checked.unwrap_or(false)
    }

    pub fn table_data(&self) -> Option<&TableData> {
        self.properties.table_data.as_ref()
    }

    pub fn table_data_mut(&mut self) -> Option<&mut TableData> {
        if self.kind != BlockType::Table {
            return None;
        }
        self.properties.table_data.as_mut()
    }

    /// Switches the variant, applying per-variant entry rules.
    ///
    /// - `divider` clears `content`.
    /// - `table` clears `content` and seeds a 2x2 grid when none is present.
    /// - `todo` defaults `checked` to `false` when unset.
    pub fn change_type(&mut self, kind: BlockType) {
        self.kind = kind;
        match kind {
            BlockType::Divider => self.content.clear(),
            BlockType::Table => {
                self.content.clear();
                if self.properties.table_data.is_none() {
                    self.properties.table_data = Some(TableData::empty(2, 2));
                }
            }
            BlockType::Todo => {
                self.properties.checked.get_or_insert(false);
            }
            _ => {}
        }
    }

    /// Validates block invariants.
    pub fn validate(&self) -> Result<(), BlockValidationError> {
        if self.id.trim().is_empty() {
            return Err(BlockValidationError::EmptyId);
        }
        if self.kind == BlockType::Table {
            self.table_data()
                .ok_or(BlockValidationError::MissingTableData)?
                .validate()?;
        }
        Ok(())
    }

    /// Repairs invariant violations found in persisted data.
    ///
    /// Returns whether the block changed.
    pub(crate) fn repair(&mut self) -> bool {
        let mut changed = false;
        if self.id.trim().is_empty() {
            self.id = generate_block_id();
            changed = true;
        }
        if !self.kind.has_content() && !self.content.is_empty() {
            self.content.clear();
            changed = true;
        }
        if self.kind == BlockType::Table {
            match self.properties.table_data.as_mut() {
                Some(table) => changed |= table.normalize(),
                None => {
                    self.properties.table_data = Some(TableData::empty(2, 2));
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Generates a fresh opaque block id.
pub fn generate_block_id() -> BlockId {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::{Block, BlockType, BlockValidationError, TableData};

    #[test]
    fn new_table_block_seeds_two_by_two_grid() {
        let block = Block::new(BlockType::Table, "ignored");
        assert!(block.content.is_empty());
        let table = block.table_data().unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn change_type_to_table_keeps_existing_grid() {
        let mut block = Block::table(TableData::empty(3, 1));
        block.change_type(BlockType::Text);
        block.change_type(BlockType::Table);
        assert_eq!(block.table_data().unwrap().row_count(), 3);
    }

    #[test]
    fn table_refuses_to_shrink_below_one_row_or_column() {
        let mut table = TableData::empty(1, 1);
        assert!(!table.remove_row());
        assert!(!table.remove_column());
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 1);
    }

    #[test]
    fn from_rows_pads_ragged_rows() {
        let table = TableData::from_rows(vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
        ]);
        assert!(table.validate().is_ok());
        assert_eq!(table.cell(0, 1), Some(""));
    }

    #[test]
    fn with_id_rejects_blank_id() {
        let err = Block::with_id("  ", BlockType::Text, "x").unwrap_err();
        assert_eq!(err, BlockValidationError::EmptyId);
    }

    #[test]
    fn wire_names_roundtrip() {
        for kind in BlockType::ALL {
            assert_eq!(BlockType::from_wire(kind.as_str()), Some(kind));
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }
}
