use blockpad_core::config::{HISTORY_KEY, PAGES_KEY};
use blockpad_core::{
    BlobStore, BlockProperty, BlockType, MemoryBlobStore, SqliteBlobStore, StoreError, Workspace,
    WorkspaceConfig, WorkspaceError,
};
use serde_json::Value;

#[test]
fn state_survives_reopen_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workspace.sqlite3");

    let (page_id, block_id) = {
        let mut workspace = Workspace::open(SqliteBlobStore::open(&path).unwrap()).unwrap();
        let page_id = workspace.create_page(None).unwrap();
        workspace.set_page_title(&page_id, "Journal").unwrap();
        let block_id = workspace.store().page(&page_id).unwrap().blocks[0].id.clone();
        workspace
            .set_block_type(&page_id, &block_id, BlockType::Todo)
            .unwrap();
        workspace
            .set_block_content(&page_id, &block_id, "water plants")
            .unwrap();
        workspace
            .set_block_property(&page_id, &block_id, BlockProperty::Checked(true))
            .unwrap();
        (page_id, block_id)
    };

    let mut workspace = Workspace::open(SqliteBlobStore::open(&path).unwrap()).unwrap();
    let page = workspace.store().page(&page_id).unwrap();
    assert_eq!(page.title, "Journal");
    let block = page.block(&block_id).unwrap();
    assert_eq!(block.kind, BlockType::Todo);
    assert_eq!(block.content, "water plants");
    assert!(block.is_checked());
    assert_eq!(workspace.current_page_id(), Some(page_id.as_str()));

    assert_eq!(
        workspace.history().undo_description(),
        Some("Check todo")
    );
    workspace.undo().unwrap().unwrap();
    let block = workspace.store().page(&page_id).unwrap().block(&block_id).unwrap();
    assert!(!block.is_checked());
}

#[test]
fn persisted_pages_use_camel_case_wire_shape() {
    let blobs = MemoryBlobStore::new();
    let mut workspace = Workspace::open(&blobs).unwrap();
    let root = workspace.create_page(None).unwrap();
    workspace.create_page(Some(&root)).unwrap();

    let pages: Value = serde_json::from_str(&blobs.get(PAGES_KEY).unwrap().unwrap()).unwrap();
    let child = &pages.as_array().unwrap()[1];
    assert_eq!(child["parentId"], Value::String(root.clone()));
    assert!(child["createdAt"].is_i64());
    assert_eq!(child["blocks"][0]["type"], "text");

    let history: Value = serde_json::from_str(&blobs.get(HISTORY_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(history["index"], 2);
    assert_eq!(history["history"].as_array().unwrap().len(), 3);
}

#[test]
fn malformed_pages_blob_loads_empty_workspace() {
    let blobs = MemoryBlobStore::new();
    blobs.put(PAGES_KEY, "[{\"id\": 7}]").unwrap();
    blobs.put(HISTORY_KEY, "not json at all").unwrap();

    let mut workspace = Workspace::open(&blobs).unwrap();
    assert!(workspace.store().is_empty());
    assert!(workspace.current_page_id().is_none());

    workspace.create_page(None).unwrap();
    let stored = blobs.get(PAGES_KEY).unwrap().unwrap();
    assert!(serde_json::from_str::<Vec<Value>>(&stored).is_ok());
}

#[test]
fn rejected_edit_records_no_history() {
    let mut workspace = Workspace::open(MemoryBlobStore::new()).unwrap();
    let page_id = workspace.create_page(None).unwrap();
    let block_id = workspace.store().page(&page_id).unwrap().blocks[0].id.clone();
    let entries = workspace.history().entries().len();

    let err = workspace.delete_block(&page_id, &block_id).unwrap_err();
    assert!(matches!(err, WorkspaceError::Store(StoreError::LastBlock(_))));
    assert_eq!(workspace.history().entries().len(), entries);
}

#[test]
fn deleting_current_page_selects_first_remaining_root() {
    let mut workspace = Workspace::open(MemoryBlobStore::new()).unwrap();
    let older = workspace.create_page(None).unwrap();
    let newer = workspace.create_page(None).unwrap();
    let child = workspace.create_page(Some(&newer)).unwrap();

    let removed = workspace.delete_page(&newer).unwrap();
    assert_eq!(removed, vec![newer.clone(), child]);
    assert_eq!(workspace.current_page_id(), Some(older.as_str()));
    assert_eq!(
        workspace.history().undo_description(),
        Some("Delete page \"Untitled\"")
    );
}

#[test]
fn import_and_export_markdown() {
    let mut workspace = Workspace::open(MemoryBlobStore::new()).unwrap();
    let page_id = workspace
        .import_markdown("Weekly Plan.md", "# Goals\n\n- [ ] ship\n- [x] test\n")
        .unwrap();

    assert_eq!(workspace.current_page_id(), Some(page_id.as_str()));
    let page = workspace.current_page().unwrap();
    assert_eq!(page.title, "Weekly Plan");
    assert_eq!(page.blocks.len(), 3);
    assert_eq!(page.blocks[0].kind, BlockType::Heading1);

    let export = workspace.export_markdown(&page_id).unwrap();
    assert_eq!(export.file_name, "weekly-plan.md");
    assert_eq!(
        export.content,
        "# Weekly Plan\n\n# Goals\n\n- [ ] ship\n- [x] test\n"
    );
    assert!(workspace.export_markdown("missing").is_none());
}

#[test]
fn custom_config_limits_history() {
    let config = WorkspaceConfig {
        history_limit: 3,
        ..WorkspaceConfig::default()
    };
    let mut workspace = Workspace::open_with_config(MemoryBlobStore::new(), config).unwrap();
    for _ in 0..5 {
        workspace.create_page(None).unwrap();
    }
    assert_eq!(workspace.history().entries().len(), 3);
}

#[test]
fn expansion_toggle_is_persisted_without_history() {
    let blobs = MemoryBlobStore::new();
    let mut workspace = Workspace::open(&blobs).unwrap();
    let page_id = workspace.create_page(None).unwrap();
    let entries = workspace.history().entries().len();

    assert!(workspace.toggle_expanded(&page_id).unwrap());
    assert_eq!(workspace.history().entries().len(), entries);

    let reopened = Workspace::open(&blobs).unwrap();
    assert!(reopened.store().page(&page_id).unwrap().expanded);
}

#[test]
fn iso_timestamps_and_undecodable_pages_do_not_wipe_forest() {
    let blobs = MemoryBlobStore::new();
    let pages = serde_json::json!([
        {
            "id": "keep",
            "title": "Keep me",
            "icon": "📄",
            "blocks": [{ "id": "b1", "type": "text", "content": "hello", "properties": {} }],
            "createdAt": 1_700_000_000_000_i64,
            "updatedAt": 1_700_000_000_000_i64
        },
        {
            "id": "iso",
            "title": "From the browser",
            "blocks": [{ "id": "b2", "type": "heading1", "content": "Hi", "properties": {} }],
            "parentId": "keep",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z"
        },
        {
            "id": "alien",
            "title": "Unknown block type",
            "blocks": [{ "id": "b3", "type": "kanban", "content": "", "properties": {} }]
        }
    ]);
    blobs.put(PAGES_KEY, &pages.to_string()).unwrap();

    let mut workspace = Workspace::open(&blobs).unwrap();
    assert_eq!(workspace.store().len(), 2);
    let iso = workspace.store().page("iso").unwrap();
    assert_eq!(iso.created_at, 1_704_067_200_000);
    assert_eq!(iso.parent_id.as_deref(), Some("keep"));
    assert!(workspace.store().page("alien").is_none());

    workspace.create_page(None).unwrap();
    let stored = blobs.get(PAGES_KEY).unwrap().unwrap();
    assert!(stored.contains("Keep me"));
    assert!(stored.contains("From the browser"));
}

#[test]
fn editing_text_of_divider_records_no_step() {
    let mut workspace = Workspace::open(MemoryBlobStore::new()).unwrap();
    let page_id = workspace.create_page(None).unwrap();
    let block_id = workspace.store().page(&page_id).unwrap().blocks[0].id.clone();
    workspace
        .set_block_type(&page_id, &block_id, BlockType::Divider)
        .unwrap();
    let entries = workspace.history().entries().len();
    let updated_at = workspace.store().page(&page_id).unwrap().updated_at;

    workspace
        .set_block_content(&page_id, &block_id, "ignored")
        .unwrap();
    let page = workspace.store().page(&page_id).unwrap();
    assert!(page.blocks[0].content.is_empty());
    assert_eq!(page.updated_at, updated_at);
    assert_eq!(workspace.history().entries().len(), entries);
}
