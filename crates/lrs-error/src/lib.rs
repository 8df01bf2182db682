//! Unified error taxonomy for the LRS data pipeline.
//!
//! Every backend failure is a [`BackendError`] carrying one of a fixed set
//! of kinds.  The kinds are contractual: callers branch on them to decide
//! whether a failure is retryable, skippable under `ignore_errors`, or a
//! caller bug that must always surface.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Failures surfaced at the boundary of a data or LRS backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The caller supplied an argument violating the backend's contract.
    ///
    /// Never retried, never skipped: a wrong query shape, mutually
    /// exclusive actor identifiers, or a missing required target is a bug
    /// in the caller.
    #[error("invalid parameter: {0}")]
    BadParameter(String),

    /// An incoming record could not be decoded or lacks required fields.
    ///
    /// Skippable when the caller opts in via `ignore_errors`.
    #[error("bad format: {0}")]
    BadFormat(String),

    /// The backend refuses the requested operation.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// A network or driver error from the underlying client.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend's per-request timeout elapsed.
    #[error("request timed out: {0}")]
    RequestTimeout(String),

    /// A bulk flush failed mid-write.
    ///
    /// `count` is the number of rows successfully persisted by the chunks
    /// that completed before the failure; the write never over-counts.
    #[error("partial batch failure after {count} written rows: {message}")]
    PartialBatch {
        /// Rows persisted before the failing chunk.
        count: usize,
        /// Description of the chunk failure.
        message: String,
    },

    /// A record failed validation against its matched shape.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),
}

impl BackendError {
    /// `true` when the failure may be skipped under `ignore_errors`.
    ///
    /// `BadParameter` and `NotSupported` always surface; everything else
    /// is locally recoverable at the caller's request.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, Self::BadParameter(_) | Self::NotSupported(_))
    }

    /// The number of rows already persisted when this error was raised.
    pub fn written_count(&self) -> usize {
        match self {
            Self::PartialBatch { count, .. } => *count,
            _ => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation failures
// ---------------------------------------------------------------------------

/// The reason a record was rejected by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationKind {
    /// A required field is absent.
    MissingRequired,
    /// A field holds a value of the wrong JSON type.
    WrongType,
    /// A string field does not match its required pattern.
    RegexMismatch,
    /// A value falls outside its permitted range or length.
    OutOfRange,
    /// A field constrained to a literal holds a different value.
    UnexpectedLiteral,
    /// A field not declared by a closed shape boundary is present.
    UnknownField,
    /// No registered shape matches the record.
    NoMatchingShape,
    /// Two incomparable shapes match the record.
    AmbiguousShape,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingRequired => "missing required field",
            Self::WrongType => "wrong type",
            Self::RegexMismatch => "regex mismatch",
            Self::OutOfRange => "out of range",
            Self::UnexpectedLiteral => "unexpected literal",
            Self::UnknownField => "unknown field",
            Self::NoMatchingShape => "no matching shape",
            Self::AmbiguousShape => "ambiguous shape",
        };
        f.write_str(s)
    }
}

/// A structured validation failure: the first offending path and why.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{path}: {kind}: {message}")]
pub struct ValidationFailure {
    /// Dotted path to the offending field (`"event.rubric.content_hash"`),
    /// or the empty string for record-level failures.
    pub path: String,
    /// The failure kind.
    pub kind: ValidationKind,
    /// Human-readable detail.
    pub message: String,
}

impl ValidationFailure {
    /// Build a failure at `path`.
    pub fn new(path: impl Into<String>, kind: ValidationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// A record-level failure with no field path.
    pub fn record(kind: ValidationKind, message: impl Into<String>) -> Self {
        Self::new("", kind, message)
    }
}

/// Convenience alias used across backend crates.
pub type BackendResult<T> = Result<T, BackendError>;
