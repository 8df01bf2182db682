//! The append-only history journal.
//!
//! One JSON record per line.  Writers append after each successful
//! archive read or write; the `new` filter on `list` subtracts the
//! recorded identifiers from the live listing.  The journal is owned by a
//! single process; concurrent writers are not supported.

use chrono::{DateTime, Utc};
use lrs_error::{BackendError, BackendResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::contract::OperationType;

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// What a journal entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    /// An archive was fully read.
    Read,
    /// An archive was written.
    Write,
}

/// One line of the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Backend name the entry belongs to.
    pub backend: String,
    /// Read or write.
    pub action: HistoryAction,
    /// Target-scoped archive identifier (`bucket/key`, `stream/archive`).
    pub id: String,
    /// Archive file name, when the platform reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Archive size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// When the read or write completed.
    pub timestamp: DateTime<Utc>,
    /// The write operation, for write entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
}

// ---------------------------------------------------------------------------
// HistoryJournal
// ---------------------------------------------------------------------------

/// Handle on the journal file.
#[derive(Debug, Clone)]
pub struct HistoryJournal {
    path: PathBuf,
}

impl HistoryJournal {
    /// Open a journal at `path`; the file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry.
    pub async fn append(&self, entry: &HistoryEntry) -> BackendResult<()> {
        let mut line = serde_json::to_string(entry)
            .map_err(|err| BackendError::BadFormat(err.to_string()))?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|err| Self::io_error(&self.path, err))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|err| Self::io_error(&self.path, err))?;
        file.flush()
            .await
            .map_err(|err| Self::io_error(&self.path, err))
    }

    /// Read every entry, oldest first.
    pub async fn entries(&self) -> BackendResult<Vec<HistoryEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::io_error(&self.path, err)),
        };
        raw.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|err| {
                    BackendError::BadFormat(format!("corrupt history entry '{line}': {err}"))
                })
            })
            .collect()
    }

    /// Identifiers recorded for `(backend, action)`.
    pub async fn ids(&self, backend: &str, action: HistoryAction) -> BackendResult<HashSet<String>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|entry| entry.backend == backend && entry.action == action)
            .map(|entry| entry.id)
            .collect())
    }

    fn io_error(path: &std::path::Path, err: std::io::Error) -> BackendError {
        BackendError::Transport(format!("history journal {}: {err}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(backend: &str, action: HistoryAction, id: &str) -> HistoryEntry {
        HistoryEntry {
            backend: backend.to_owned(),
            action,
            id: id.to_owned(),
            filename: None,
            size: Some(67_906_662),
            timestamp: Utc::now(),
            operation_type: None,
        }
    }

    #[tokio::test]
    async fn append_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let journal = HistoryJournal::new(dir.path().join("history.jsonl"));

        journal
            .append(&entry("ldp", HistoryAction::Read, "stream-1/2020-06-16.gz"))
            .await
            .unwrap();
        journal
            .append(&entry("s3", HistoryAction::Write, "bucket/new-archive.gz"))
            .await
            .unwrap();

        let entries = journal.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "stream-1/2020-06-16.gz");
        assert_eq!(entries[1].action, HistoryAction::Write);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let journal = HistoryJournal::new(dir.path().join("absent.jsonl"));
        assert!(journal.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_filter_on_backend_and_action() {
        let dir = tempfile::tempdir().unwrap();
        let journal = HistoryJournal::new(dir.path().join("history.jsonl"));

        journal
            .append(&entry("ldp", HistoryAction::Read, "stream-1/a.gz"))
            .await
            .unwrap();
        journal
            .append(&entry("ldp", HistoryAction::Read, "stream-2/a.gz"))
            .await
            .unwrap();
        journal
            .append(&entry("s3", HistoryAction::Read, "bucket/a.gz"))
            .await
            .unwrap();
        journal
            .append(&entry("ldp", HistoryAction::Write, "stream-1/b.gz"))
            .await
            .unwrap();

        let ids = journal.ids("ldp", HistoryAction::Read).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("stream-1/a.gz"));
        assert!(ids.contains("stream-2/a.gz"));
    }
}
