use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::{Arc, Mutex};

use importer_core::{Block, FailurePolicy, FilenameCollision, FrontMatter};
use importer_engine::{
    parse_document, Converter, FailureKind, FetchError, ImportError, ImportEvent, ImportSink,
    Importer, NotionSource, RawBlock, RawPage, ResultPage,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

#[derive(Default)]
struct FakeSource {
    pages: Vec<Value>,
    children: HashMap<String, Vec<Value>>,
    failing_blocks: HashSet<String>,
    listing_fails: bool,
}

impl FakeSource {
    fn with_page(mut self, page: Value, blocks: Vec<Value>) -> Self {
        let id = page["id"].as_str().unwrap().to_string();
        self.pages.push(page);
        self.children.insert(id, blocks);
        self
    }

    fn failing(mut self, block_id: &str) -> Self {
        self.failing_blocks.insert(block_id.to_string());
        self
    }
}

fn network_error() -> FetchError {
    FetchError {
        kind: FailureKind::Network,
        message: "connection reset".into(),
    }
}

#[async_trait::async_trait]
impl NotionSource for FakeSource {
    // Serves the rows one per page to exercise cursor handling.
    async fn query_database(
        &self,
        _database_id: &str,
        cursor: Option<&str>,
    ) -> Result<ResultPage<RawPage>, FetchError> {
        if self.listing_fails {
            return Err(network_error());
        }
        let index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        let results = self
            .pages
            .get(index)
            .map(|p| vec![serde_json::from_value(p.clone()).unwrap()])
            .unwrap_or_default();
        let has_more = index + 1 < self.pages.len();
        Ok(ResultPage {
            results,
            has_more,
            next_cursor: has_more.then(|| (index + 1).to_string()),
        })
    }

    async fn block_children(
        &self,
        block_id: &str,
        _cursor: Option<&str>,
    ) -> Result<ResultPage<RawBlock>, FetchError> {
        if self.failing_blocks.contains(block_id) {
            return Err(network_error());
        }
        let results = self
            .children
            .get(block_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|b| serde_json::from_value(b).unwrap())
            .collect();
        Ok(ResultPage {
            results,
            has_more: false,
            next_cursor: None,
        })
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<ImportEvent>>,
}

impl CollectingSink {
    fn take(&self) -> Vec<ImportEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ImportSink for CollectingSink {
    fn emit(&self, event: ImportEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn page(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "created_time": "2024-01-01T00:00:00Z",
        "properties": {
            "Name": { "type": "title", "title": [{ "plain_text": title }] }
        }
    })
}

fn paragraph(id: &str, text: &str) -> Value {
    json!({
        "id": id, "type": "paragraph", "has_children": false,
        "paragraph": { "rich_text": [{ "plain_text": text }] }
    })
}

fn importer(source: FakeSource, dir: &TempDir) -> Importer {
    Importer::new(Arc::new(source), "db", dir.path().join("posts"))
}

fn read(dir: &TempDir, filename: &str) -> (FrontMatter, String) {
    let content = fs::read_to_string(dir.path().join("posts").join(filename)).unwrap();
    parse_document(&content).unwrap()
}

#[tokio::test]
async fn first_post_is_written_with_expected_front_matter() {
    importer_logging::initialize_for_tests();
    let entry = json!({
        "id": "p1",
        "created_time": "2024-01-01T00:00:00Z",
        "icon": { "type": "emoji", "emoji": "🚀" },
        "properties": {
            "Name": { "type": "title", "title": [{ "plain_text": "My First Post" }] },
            "date": { "type": "date", "date": null },
            "tags": { "type": "multi_select", "multi_select": [{ "name": "go" }, { "name": "rust" }] },
            "series": { "type": "select", "select": null }
        }
    });
    let source = FakeSource::default().with_page(entry, vec![paragraph("b1", "Hello")]);
    let dir = TempDir::new().unwrap();
    let sink = CollectingSink::default();

    let report = importer(source, &dir).run(&sink).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.written[0].filename, "my-first-post.md");
    let (front_matter, body) = read(&dir, "my-first-post.md");
    assert_eq!(
        front_matter,
        FrontMatter {
            title: "My First Post".into(),
            date: "2024-01-01T00:00:00Z".into(),
            tags: vec!["go".into(), "rust".into()],
            series: String::new(),
            emoji: "🚀".into(),
        }
    );
    assert_eq!(body, "Hello");

    let events = sink.take();
    assert_eq!(events[0], ImportEvent::EntriesFetched { count: 1 });
    assert!(matches!(
        &events[1],
        ImportEvent::EntryWritten { filename, .. } if filename == "my-first-post.md"
    ));
}

#[tokio::test]
async fn explicit_date_and_series_come_from_properties() {
    let entry = json!({
        "id": "p1",
        "created_time": "2024-01-01T00:00:00Z",
        "properties": {
            "Title": { "type": "title", "title": [{ "plain_text": "Dated" }] },
            "Date": { "type": "date", "date": { "start": "2023-07-04", "end": null } },
            "Series": { "type": "rich_text", "rich_text": [{ "plain_text": "Rust Basics" }] }
        }
    });
    let source = FakeSource::default().with_page(entry, Vec::new());
    let dir = TempDir::new().unwrap();

    importer(source, &dir)
        .run(&CollectingSink::default())
        .await
        .unwrap();

    let (front_matter, _) = read(&dir, "dated.md");
    assert_eq!(front_matter.date, "2023-07-04");
    assert_eq!(front_matter.series, "Rust Basics");
}

#[tokio::test]
async fn empty_title_uses_placeholder_filename() {
    let source = FakeSource::default().with_page(page("p1", ""), Vec::new());
    let dir = TempDir::new().unwrap();

    let report = importer(source, &dir)
        .run(&CollectingSink::default())
        .await
        .unwrap();

    assert_eq!(report.written[0].filename, "제목-없음.md");
    let (front_matter, _) = read(&dir, "제목-없음.md");
    assert_eq!(front_matter.title, "제목 없음");
}

#[tokio::test]
async fn whitespace_variant_titles_collide_and_last_fetched_wins() {
    let source = FakeSource::default()
        .with_page(page("p1", "Hello World"), vec![paragraph("a", "first body")])
        .with_page(page("p2", "Hello  World"), vec![paragraph("b", "second body")]);
    let dir = TempDir::new().unwrap();
    let sink = CollectingSink::default();

    let report = importer(source, &dir).run(&sink).await.unwrap();

    assert_eq!(report.written.len(), 2);
    let expected = FilenameCollision {
        filename: "hello-world.md".into(),
        overwritten_entry_id: "p1".into(),
        entry_id: "p2".into(),
    };
    assert_eq!(report.collisions, vec![expected.clone()]);
    assert!(sink
        .take()
        .contains(&ImportEvent::FilenameCollision(expected)));

    let (front_matter, body) = read(&dir, "hello-world.md");
    assert_eq!(front_matter.title, "Hello  World");
    assert_eq!(body, "second body");
}

#[tokio::test]
async fn unrecognized_block_keeps_entry_and_sibling_order() {
    let blocks = vec![
        paragraph("b1", "alpha"),
        json!({
            "id": "b2", "type": "meeting_notes", "has_children": false,
            "meeting_notes": { "title": "whatever" }
        }),
        json!({
            "id": "b3", "type": "synced_block", "has_children": true,
            "synced_block": { "synced_from": null }
        }),
        paragraph("b4", "omega"),
    ];
    let mut source = FakeSource::default().with_page(page("p1", "Mixed"), blocks);
    source
        .children
        .insert("b3".into(), vec![paragraph("b3a", "inside synced")]);
    let dir = TempDir::new().unwrap();

    let report = importer(source, &dir)
        .run(&CollectingSink::default())
        .await
        .unwrap();

    assert!(report.is_success());
    let (_, body) = read(&dir, "mixed.md");
    assert_eq!(body, "alpha\n\ninside synced\n\nomega");
}

#[tokio::test]
async fn failed_entry_is_reported_and_batch_continues() {
    let source = FakeSource::default()
        .with_page(page("good-1", "One"), vec![paragraph("a", "one")])
        .with_page(page("bad", "Two"), Vec::new())
        .with_page(page("good-2", "Three"), vec![paragraph("c", "three")])
        .failing("bad");
    let dir = TempDir::new().unwrap();
    let sink = CollectingSink::default();

    let report = importer(source, &dir).run(&sink).await.unwrap();

    assert!(!report.is_success());
    assert!(!report.aborted);
    assert_eq!(report.failed_ids(), vec!["bad"]);
    assert_eq!(report.written.len(), 2);
    assert!(dir.path().join("posts").join("one.md").exists());
    assert!(!dir.path().join("posts").join("two.md").exists());
    assert!(dir.path().join("posts").join("three.md").exists());
    assert!(sink
        .take()
        .iter()
        .any(|e| matches!(e, ImportEvent::EntryFailed { entry_id, .. } if entry_id == "bad")));
}

#[tokio::test]
async fn abort_policy_stops_at_first_failure() {
    let source = FakeSource::default()
        .with_page(page("bad", "Two"), Vec::new())
        .with_page(page("good", "Three"), Vec::new())
        .failing("bad");
    let dir = TempDir::new().unwrap();

    let report = importer(source, &dir)
        .with_failure_policy(FailurePolicy::Abort)
        .run(&CollectingSink::default())
        .await
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.failed_ids(), vec!["bad"]);
    assert!(report.written.is_empty());
}

#[tokio::test]
async fn listing_failure_is_fatal_and_writes_nothing() {
    let source = FakeSource {
        listing_fails: true,
        ..FakeSource::default()
    };
    let dir = TempDir::new().unwrap();

    let err = importer(source, &dir)
        .run(&CollectingSink::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Fetch(ref e) if e.kind == FailureKind::Network));
    let written: Vec<_> = fs::read_dir(dir.path().join("posts")).unwrap().collect();
    assert!(written.is_empty());
}

#[tokio::test]
async fn rerun_refreshes_existing_files() {
    let dir = TempDir::new().unwrap();
    let first = FakeSource::default().with_page(page("p1", "Post"), vec![paragraph("a", "old")]);
    importer(first, &dir)
        .run(&CollectingSink::default())
        .await
        .unwrap();

    let second = FakeSource::default().with_page(page("p1", "Post"), vec![paragraph("a", "new")]);
    importer(second, &dir)
        .run(&CollectingSink::default())
        .await
        .unwrap();

    let (_, body) = read(&dir, "post.md");
    assert_eq!(body, "new");
}

struct BlockCountConverter;

impl Converter for BlockCountConverter {
    fn to_markdown(&self, blocks: &[Block]) -> String {
        format!("{} blocks", blocks.len())
    }
}

#[tokio::test]
async fn custom_converter_renders_the_body() {
    let source = FakeSource::default().with_page(
        page("p1", "Counted"),
        vec![paragraph("b1", "one"), paragraph("b2", "two")],
    );
    let dir = TempDir::new().unwrap();

    importer(source, &dir)
        .with_converter(Arc::new(BlockCountConverter))
        .run(&CollectingSink::default())
        .await
        .unwrap();

    let (front_matter, body) = read(&dir, "counted.md");
    assert_eq!(front_matter.title, "Counted");
    assert_eq!(body, "2 blocks");
}
