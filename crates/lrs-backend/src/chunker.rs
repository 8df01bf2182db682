//! Stream adapters shared by every writing backend.
//!
//! Ingestion always follows the same shape: peek the input to catch the
//! empty case, decode bytes into records where needed, fold records into
//! the backend's tuple form, and flush fixed-size chunks through the
//! backend's bulk-import primitive.  The first two steps live here; the
//! fold and flush are backend-specific.

use futures::stream::{self, BoxStream, StreamExt};
use lrs_error::{BackendError, BackendResult};
use serde_json::Value;
use tracing::warn;

// ---------------------------------------------------------------------------
// WriteRecord / WriteStream
// ---------------------------------------------------------------------------

/// One element of a write input sequence: raw bytes or a decoded record.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRecord {
    /// A JSON-encoded line.
    Bytes(Vec<u8>),
    /// An already-decoded record.
    Value(Value),
}

impl From<Value> for WriteRecord {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<u8>> for WriteRecord {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Lazy sequence of write inputs.
pub type WriteStream = BoxStream<'static, WriteRecord>;

/// Build a write stream from an iterator of records.
pub fn write_stream<I, T>(records: I) -> WriteStream
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
    T: Into<WriteRecord> + 'static,
{
    stream::iter(records.into_iter().map(Into::into)).boxed()
}

// ---------------------------------------------------------------------------
// Peek
// ---------------------------------------------------------------------------

/// Pull the first element off `data`, returning `None` when the sequence
/// is empty and otherwise a stream equivalent to the original.
///
/// Callers return a zero count for the empty case without touching the
/// backend.
pub async fn peek(mut data: WriteStream) -> Option<WriteStream> {
    let first = data.next().await?;
    Some(stream::once(async move { first }).chain(data).boxed())
}

// ---------------------------------------------------------------------------
// Byte decoding
// ---------------------------------------------------------------------------

/// Decode a write stream into records.
///
/// Bytes elements are parsed as one JSON record per element; parse
/// failures are skipped (and logged at warning) under `ignore_errors`,
/// raised otherwise.  Decoded elements pass through unchanged.
pub fn into_values(
    data: WriteStream,
    ignore_errors: bool,
) -> BoxStream<'static, BackendResult<Value>> {
    data.filter_map(move |record| async move {
        match record {
            WriteRecord::Value(value) => Some(Ok(value)),
            WriteRecord::Bytes(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Some(Ok(value)),
                Err(err) => {
                    let msg = format!(
                        "Failed to decode JSON: {err}, for document {}",
                        String::from_utf8_lossy(&bytes)
                    );
                    if ignore_errors {
                        warn!("{msg}");
                        None
                    } else {
                        Some(Err(BackendError::BadFormat(msg)))
                    }
                }
            },
        }
    })
    .boxed()
}
