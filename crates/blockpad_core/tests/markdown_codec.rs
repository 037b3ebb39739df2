use blockpad_core::markdown::{self, export_file_name, import_title, parse, serialize_blocks};
use blockpad_core::{Block, BlockType, Page, TableData};

fn kinds(blocks: &[Block]) -> Vec<BlockType> {
    blocks.iter().map(|block| block.kind).collect()
}

#[test]
fn heading_and_bullets_round_trip() {
    let blocks = vec![
        Block::new(BlockType::Heading1, "Groceries"),
        Block::new(BlockType::BulletedList, "milk"),
        Block::new(BlockType::BulletedList, "eggs"),
    ];
    let text = serialize_blocks(&blocks);
    assert_eq!(text, "# Groceries\n\n- milk\n- eggs\n");

    let parsed = parse(&text);
    assert_eq!(kinds(&parsed), kinds(&blocks));
    let contents: Vec<&str> = parsed.iter().map(|block| block.content.as_str()).collect();
    assert_eq!(contents, vec!["Groceries", "milk", "eggs"]);
}

#[test]
fn fenced_code_keeps_inner_lines_verbatim() {
    let parsed = parse("```\nfoo\nbar\n```\n");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].kind, BlockType::Code);
    assert_eq!(parsed[0].content, "foo\nbar");
    assert_eq!(parsed[0].properties.language, None);
}

#[test]
fn fence_suppresses_other_rules() {
    let parsed = parse("```\n# not a heading\n- not a bullet\n```");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].content, "# not a heading\n- not a bullet");
}

#[test]
fn todo_markers_set_checked_state() {
    let parsed = parse("- [x] done\n- [ ] open\n- [X] also done");
    assert_eq!(
        kinds(&parsed),
        vec![BlockType::Todo, BlockType::Todo, BlockType::Todo]
    );
    let checked: Vec<bool> = parsed.iter().map(Block::is_checked).collect();
    assert_eq!(checked, vec![true, false, true]);
    assert_eq!(parsed[0].content, "done");
}

#[test]
fn mixed_document_classification() {
    let text = "## Section\n\nplain words\n> quoted\n---\n3. third\n\n\n### Small";
    let parsed = parse(text);
    assert_eq!(
        kinds(&parsed),
        vec![
            BlockType::Heading2,
            BlockType::Text,
            BlockType::Quote,
            BlockType::Divider,
            BlockType::NumberedList,
            BlockType::Heading3,
        ]
    );
    assert_eq!(parsed[4].content, "third");
}

#[test]
fn table_round_trip_preserves_cells() {
    let table = TableData::from_rows(vec![
        vec!["Name".to_string(), "Qty".to_string()],
        vec!["pipe | inside".to_string(), "2".to_string()],
    ]);
    let blocks = vec![Block::table(table.clone())];
    let parsed = parse(&serialize_blocks(&blocks));
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].table_data(), Some(&table));
}

#[test]
fn page_export_includes_title_heading() {
    let mut page = Page::new("Trip: Paris/Rome", None);
    page.blocks = vec![Block::todo("book hotel", false), Block::new(BlockType::Divider, "")];
    assert_eq!(
        markdown::serialize(&page),
        "# Trip: Paris/Rome\n\n- [ ] book hotel\n---\n\n"
    );
    assert_eq!(export_file_name(&page.title), "trip--paris-rome.md");
}

#[test]
fn import_helpers_handle_empty_input() {
    let blocks = markdown::parse_for_import("\n\n   \n");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].kind, BlockType::Text);
    assert!(blocks[0].content.is_empty());

    assert_eq!(import_title("notes/Meeting Notes.md"), "Meeting Notes");
    assert_eq!(import_title(".md"), ".md");
    assert_eq!(export_file_name(""), "untitled.md");
}

#[test]
fn pipe_text_and_bracket_bullets_round_trip() {
    let blocks = vec![
        Block::new(BlockType::Text, "| a |"),
        Block::new(BlockType::BulletedList, "[x]"),
        Block::new(BlockType::BulletedList, "[ ]"),
    ];
    let parsed = parse(&serialize_blocks(&blocks));
    assert_eq!(kinds(&parsed), kinds(&blocks));
    let contents: Vec<&str> = parsed.iter().map(|block| block.content.as_str()).collect();
    assert_eq!(contents, vec!["| a |", "[x]", "[ ]"]);
}

#[test]
fn table_cell_that_looks_like_a_separator_survives() {
    let table = TableData::from_rows(vec![
        vec!["Step".to_string()],
        vec!["---".to_string()],
    ]);
    let parsed = parse(&serialize_blocks(&[Block::table(table.clone())]));
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].table_data(), Some(&table));
}
