//! The uniform data backend contract.

use async_trait::async_trait;
use futures::stream::BoxStream;
use lrs_error::BackendResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::chunker::WriteStream;

// ---------------------------------------------------------------------------
// DataBackendStatus
// ---------------------------------------------------------------------------

/// Outcome of a status probe.
///
/// Probes are synchronous in spirit: every call runs fresh, nothing is
/// cached, and the probe is the only place where transport failures are
/// converted into a value instead of raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBackendStatus {
    /// The backend is reachable and healthy.
    Ok,
    /// A transport-level failure: connection refused, timeout, DNS.
    Away,
    /// The peer is reachable but unhealthy (non-green cluster, forbidden
    /// bucket).
    Error,
}

// ---------------------------------------------------------------------------
// OperationType
// ---------------------------------------------------------------------------

/// The write operation requested by the caller.
///
/// Each backend admits a subset; everything else fails with
/// `NotSupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Insert a new record; pre-existing targets are an error.
    Create,
    /// Index a record (idempotent create in search clusters).
    Index,
    /// Overwrite an existing record.
    Update,
    /// Append to an existing target.
    Append,
    /// Remove a record.
    Delete,
}

impl OperationType {
    /// Lowercase wire name of the operation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Index => "index",
            Self::Update => "update",
            Self::Append => "append",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stream item types
// ---------------------------------------------------------------------------

/// One element of a `list` stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ListItem {
    /// An identifier (object key, archive id, table or index name).
    Id(String),
    /// A detail record for the identifier.
    Details(Value),
}

impl ListItem {
    /// The identifier, when this item is one.
    pub fn as_id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Details(_) => None,
        }
    }
}

/// One element of a `read` stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadItem {
    /// JSON-encoded bytes in the backend's configured locale encoding.
    Bytes(Vec<u8>),
    /// A decoded record.
    Value(Value),
}

impl ReadItem {
    /// The decoded record, when this item is one.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Bytes(_) => None,
            Self::Value(value) => Some(value),
        }
    }
}

/// Lazy sequence of list results.
pub type ListStream = BoxStream<'static, BackendResult<ListItem>>;

/// Lazy sequence of read results.
pub type ReadStream = BoxStream<'static, BackendResult<ReadItem>>;

// ---------------------------------------------------------------------------
// DataBackend
// ---------------------------------------------------------------------------

/// The uniform contract every data backend satisfies.
///
/// `read` validates its query against the backend's declared query model
/// before dispatching — a mismatched query fails synchronously with
/// `BadParameter` rather than surfacing mid-stream.  Consumers may stop
/// iterating any returned stream at any point; backends release their
/// connections at the next suspension.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// The backend's declared query model.
    type Query: Send + Sync;

    /// Short name used in history entries and logs.
    fn name(&self) -> &'static str;

    /// Probe the backend and report its state.
    async fn status(&self) -> DataBackendStatus;

    /// List identifiers (or detail records) under `target`.
    ///
    /// With `new`, identifiers already recorded in the history journal
    /// under `(backend, read)` are filtered out.
    async fn list(&self, target: Option<&str>, details: bool, new: bool)
        -> BackendResult<ListStream>;

    /// Read records matching `query` from `target`.
    async fn read(
        &self,
        query: Option<&Self::Query>,
        target: Option<&str>,
        chunk_size: Option<usize>,
        raw_output: bool,
        ignore_errors: bool,
    ) -> BackendResult<ReadStream>;

    /// Write `data` to `target`, returning the number of records actually
    /// persisted.
    ///
    /// Chunks are flushed independently: with `ignore_errors` a failed
    /// chunk contributes zero to the count and is logged at warning;
    /// without it, the first failure raises with the count so far
    /// attached.
    async fn write(
        &self,
        data: WriteStream,
        target: Option<&str>,
        chunk_size: Option<usize>,
        ignore_errors: bool,
        operation_type: Option<OperationType>,
    ) -> BackendResult<usize>;
}
