//! Importer core: content model and pure normalization rules.
mod filename;
mod metadata;
mod model;
mod report;

pub use filename::{document_filename, normalize_title};
pub use metadata::{derive_front_matter, normalize_entry, UNTITLED_PLACEHOLDER};
pub use model::{
    plain_text, Annotations, Block, BlockKind, DateRange, EntryId, EntryProperties, FrontMatter,
    Icon, NormalizedDocument, PropertyValue, RemoteEntry, RichText, TagRef,
};
pub use report::{
    BatchReport, EntryOutcome, FailedEntry, FailurePolicy, FilenameCollision, WrittenEntry,
};
