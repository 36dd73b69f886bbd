use std::path::PathBuf;

use crate::model::EntryId;

/// What the batch driver does after an entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Record the failure and move on to the next entry.
    #[default]
    Continue,
    /// Stop after the first failed entry.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenEntry {
    pub entry_id: EntryId,
    pub filename: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub entry_id: EntryId,
    pub reason: String,
}

/// A later entry wrote a filename an earlier entry of the same run already wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCollision {
    pub filename: String,
    pub overwritten_entry_id: EntryId,
    pub entry_id: EntryId,
}

pub type EntryOutcome = Result<WrittenEntry, FailedEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub written: Vec<WrittenEntry>,
    pub failed: Vec<FailedEntry>,
    pub collisions: Vec<FilenameCollision>,
    pub aborted: bool,
}

impl BatchReport {
    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            Ok(written) => self.written.push(written),
            Err(failed) => self.failed.push(failed),
        }
    }

    /// Id of the entry that last wrote `filename` in this run, if any.
    pub fn last_writer_of(&self, filename: &str) -> Option<&EntryId> {
        self.written
            .iter()
            .rev()
            .find(|w| w.filename == filename)
            .map(|w| &w.entry_id)
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.entry_id.as_str()).collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.aborted
    }
}
