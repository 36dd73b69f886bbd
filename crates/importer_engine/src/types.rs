use std::fmt;
use std::path::PathBuf;

use importer_core::{EntryId, FilenameCollision};

use crate::frontmatter::FrontMatterError;
use crate::persist::PersistError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    EntriesFetched {
        count: usize,
    },
    EntryWritten {
        entry_id: EntryId,
        filename: String,
        path: PathBuf,
    },
    EntryFailed {
        entry_id: EntryId,
        message: String,
    },
    FilenameCollision(FilenameCollision),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Unauthorized,
    RateLimited,
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Failures that end a run before any entry is processed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("listing database entries failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    OutputDir(#[from] PersistError),
}

/// Why a single entry could not be written. Never aborts the batch by itself.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("block fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
