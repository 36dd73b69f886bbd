use std::path::PathBuf;
use std::sync::Arc;

use importer_core::{
    normalize_entry, BatchReport, FailedEntry, FailurePolicy, FilenameCollision, RemoteEntry,
    WrittenEntry,
};
use importer_logging::{importer_debug, importer_error, importer_info, importer_warn};

use crate::config::ImportConfig;
use crate::convert::{Converter, MarkdownConverter};
use crate::fetch::{fetch_all_entries, fetch_block_tree, NotionHttpClient, NotionSource};
use crate::frontmatter::render_document;
use crate::persist::{ensure_output_dir, AtomicFileWriter};
use crate::{EntryError, FetchError, ImportError, ImportEvent};

pub trait ImportSink: Send + Sync {
    fn emit(&self, event: ImportEvent);
}

/// Reports progress through the log: one line per written file.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl ImportSink for LoggingSink {
    fn emit(&self, event: ImportEvent) {
        match event {
            ImportEvent::EntriesFetched { count } => importer_info!("{count} entries to import"),
            ImportEvent::EntryWritten { filename, .. } => importer_info!("✔ {filename} written"),
            ImportEvent::EntryFailed { entry_id, message } => {
                importer_error!("✘ entry {entry_id} failed: {message}")
            }
            ImportEvent::FilenameCollision(collision) => importer_warn!(
                "{} was already written by entry {} in this run; entry {} overwrites it",
                collision.filename,
                collision.overwritten_entry_id,
                collision.entry_id
            ),
        }
    }
}

/// Pulls every entry of one database and writes one document per entry.
pub struct Importer {
    source: Arc<dyn NotionSource>,
    converter: Arc<dyn Converter>,
    writer: AtomicFileWriter,
    database_id: String,
    policy: FailurePolicy,
}

impl Importer {
    pub fn new(
        source: Arc<dyn NotionSource>,
        database_id: impl Into<String>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            converter: Arc::new(MarkdownConverter),
            writer: AtomicFileWriter::new(output_dir),
            database_id: database_id.into(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn from_config(config: &ImportConfig) -> Result<Self, FetchError> {
        let client = NotionHttpClient::new(config)?;
        Ok(Self::new(
            Arc::new(client),
            config.database_id.clone(),
            config.output_dir.clone(),
        )
        .with_failure_policy(config.failure_policy))
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run one batch. Only an unusable output directory or a failed entry
    /// listing is fatal; per-entry failures end up in the report.
    pub async fn run(&self, sink: &dyn ImportSink) -> Result<BatchReport, ImportError> {
        ensure_output_dir(self.writer.dir())?;

        let entries = fetch_all_entries(self.source.as_ref(), &self.database_id).await?;
        sink.emit(ImportEvent::EntriesFetched {
            count: entries.len(),
        });

        let mut report = BatchReport::default();
        for entry in entries {
            let entry_id = entry.id.clone();
            match self.import_entry(entry).await {
                Ok(written) => {
                    if let Some(previous) = report.last_writer_of(&written.filename) {
                        let collision = FilenameCollision {
                            filename: written.filename.clone(),
                            overwritten_entry_id: previous.clone(),
                            entry_id: written.entry_id.clone(),
                        };
                        sink.emit(ImportEvent::FilenameCollision(collision.clone()));
                        report.collisions.push(collision);
                    }
                    sink.emit(ImportEvent::EntryWritten {
                        entry_id: written.entry_id.clone(),
                        filename: written.filename.clone(),
                        path: written.path.clone(),
                    });
                    report.record(Ok(written));
                }
                Err(err) => {
                    sink.emit(ImportEvent::EntryFailed {
                        entry_id: entry_id.clone(),
                        message: err.to_string(),
                    });
                    report.record(Err(FailedEntry {
                        entry_id,
                        reason: err.to_string(),
                    }));
                    if self.policy == FailurePolicy::Abort {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        importer_debug!(
            "batch finished: {} written, {} failed, {} collisions",
            report.written.len(),
            report.failed.len(),
            report.collisions.len()
        );
        Ok(report)
    }

    /// Fetch, convert, normalize and write a single entry.
    pub async fn import_entry(&self, mut entry: RemoteEntry) -> Result<WrittenEntry, EntryError> {
        let blocks = fetch_block_tree(self.source.as_ref(), &entry.id).await?;
        entry.blocks = blocks;

        let body = self.converter.to_markdown(&entry.blocks);
        let doc = normalize_entry(&entry, body);
        let content = render_document(&doc)?;
        let path = self.writer.write(&doc.filename, &content)?;

        Ok(WrittenEntry {
            entry_id: entry.id,
            filename: doc.filename,
            path,
        })
    }
}
