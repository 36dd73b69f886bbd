//! Importer engine: Notion access, conversion and the write pipeline.
mod config;
mod convert;
mod fetch;
mod frontmatter;
mod importer;
mod parse;
mod persist;
mod types;

pub use config::{
    ConfigError, ImportConfig, API_BASE_VAR, DATABASE_ID_VAR, DEFAULT_API_BASE,
    DEFAULT_NOTION_VERSION, DEFAULT_OUTPUT_DIR, NOTION_VERSION_VAR, OUTPUT_DIR_VAR, TOKEN_VAR,
};
pub use convert::{Converter, MarkdownConverter};
pub use fetch::{
    fetch_all_entries, fetch_block_tree, FetchSettings, NotionHttpClient, NotionSource, PAGE_SIZE,
};
pub use frontmatter::{
    lift_embedded_front_matter, lift_front_matter_in_file, parse_document, render_document,
    FrontMatterError,
};
pub use importer::{ImportSink, Importer, LoggingSink};
pub use parse::{parse_block_kind, parse_entry, RawBlock, RawPage, ResultPage};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{EntryError, FailureKind, FetchError, ImportError, ImportEvent};
