//! Block to markdown serializer.

use crate::markdown::parse::FENCE;
use crate::model::block::{Block, BlockType, TableData};
use crate::model::page::Page;

/// Serializes a page as `# <title>` followed by its blocks.
pub fn serialize(page: &Page) -> String {
    let mut out = format!("# {}\n\n", page.title);
    out.push_str(&serialize_blocks(&page.blocks));
    out
}

/// Serializes blocks without a title heading.
pub fn serialize_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block);
    }
    out
}

fn write_block(out: &mut String, block: &Block) {
    let content = block.content.as_str();
    match block.kind {
        BlockType::Text => push_paragraph(out, "", content),
        BlockType::Heading1 => push_paragraph(out, "# ", content),
        BlockType::Heading2 => push_paragraph(out, "## ", content),
        BlockType::Heading3 => push_paragraph(out, "### ", content),
        BlockType::Quote => push_paragraph(out, "> ", content),
        BlockType::Todo => {
            let marker = if block.is_checked() { "- [x] " } else { "- [ ] " };
            push_item(out, marker, content);
        }
        BlockType::BulletedList => push_item(out, "- ", content),
        BlockType::NumberedList => push_item(out, "1. ", content),
        BlockType::Code => {
            out.push_str(FENCE);
            if let Some(language) = block.properties.language.as_deref() {
                out.push_str(language);
            }
            out.push('\n');
            out.push_str(content);
            out.push('\n');
            out.push_str(FENCE);
            out.push_str("\n\n");
        }
        BlockType::Divider => out.push_str("---\n\n"),
        BlockType::Table => {
            if let Some(table) = block.table_data() {
                write_table(out, table);
            }
        }
    }
}

/// Paragraph-like blocks are followed by a blank line.
fn push_paragraph(out: &mut String, prefix: &str, content: &str) {
    out.push_str(prefix);
    out.push_str(content);
    out.push_str("\n\n");
}

/// List items stay adjacent: no trailing blank line.
fn push_item(out: &mut String, marker: &str, content: &str) {
    out.push_str(marker);
    out.push_str(content);
    out.push('\n');
}

fn write_table(out: &mut String, table: &TableData) {
    for (index, row) in table.rows().iter().enumerate() {
        write_table_row(out, row.iter().map(|cell| escape_cell(cell)));
        if index == 0 {
            write_table_row(out, (0..row.len()).map(|_| "---".to_string()));
        }
    }
    out.push('\n');
}

fn write_table_row(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell);
        out.push_str(" |");
    }
    out.push('\n');
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\n', '\r'], " ")
}
