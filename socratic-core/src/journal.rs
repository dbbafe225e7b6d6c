//! Rejection journal: the durable log of locally recovered failures.
//!
//! Unlike the memory partitions, the journal is one shared append log, so it
//! is the single structure written with read-all / append / rewrite-all.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::storage::{read_json, write_json};

/// Severity recorded with a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalLevel {
    Warn,
    Error,
}

impl std::fmt::Display for JournalLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One recovered failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionEntry {
    pub timestamp: DateTime<Utc>,
    pub level: JournalLevel,
    /// Error kind, e.g. `validation` or `not_found`
    pub kind: String,
    pub message: String,
}

impl RejectionEntry {
    /// Build an entry from a recoverable error.
    pub fn from_error(error: &Error) -> Self {
        let level = match error {
            Error::InvalidConclusion(_) => JournalLevel::Warn,
            _ => JournalLevel::Error,
        };
        Self {
            timestamp: Utc::now(),
            level,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Append-only journal backed by a single JSON array file.
#[derive(Debug, Clone)]
pub struct RejectionJournal {
    path: PathBuf,
}

impl RejectionJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a recoverable error and return the entry that was written.
    pub fn record(&self, error: &Error) -> Result<RejectionEntry> {
        let entry = RejectionEntry::from_error(error);
        warn!(kind = %entry.kind, level = %entry.level, "{}", entry.message);
        self.append(entry.clone())?;
        Ok(entry)
    }

    /// Append an entry: read the whole array, push, rewrite the whole array.
    pub fn append(&self, entry: RejectionEntry) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry);
        write_json(&self.path, &entries)
    }

    /// All entries in append order. A missing journal is empty.
    pub fn entries(&self) -> Result<Vec<RejectionEntry>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Entries of one kind, in append order.
    pub fn entries_of_kind(&self, kind: &str) -> Result<Vec<RejectionEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_journal_is_empty() {
        let dir = tempdir().unwrap();
        let journal = RejectionJournal::new(dir.path().join("rejections.json"));
        assert!(journal.entries().unwrap().is_empty());
    }

    #[test]
    fn test_record_appends_in_order() {
        let dir = tempdir().unwrap();
        let journal = RejectionJournal::new(dir.path().join("rejections.json"));

        journal
            .record(&Error::Validation("empty premise".into()))
            .unwrap();
        journal.record(&Error::NotFound("Q".into())).unwrap();
        journal
            .record(&Error::InvalidConclusion("maybe".into()))
            .unwrap();

        let entries = journal.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, "validation");
        assert_eq!(entries[0].level, JournalLevel::Error);
        assert_eq!(entries[1].message, "Premise not found: Q");
        assert_eq!(entries[2].level, JournalLevel::Warn);
        assert_eq!(journal.entries_of_kind("not_found").unwrap().len(), 1);
    }

    #[test]
    fn test_journal_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rejections.json");
        RejectionJournal::new(&path)
            .record(&Error::NotFound("P".into()))
            .unwrap();

        let reopened = RejectionJournal::new(&path);
        assert_eq!(reopened.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_entry_serializes_level_and_message() {
        let entry = RejectionEntry::from_error(&Error::Validation("x".into()));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["message"], "Validation error: x");
    }
}
