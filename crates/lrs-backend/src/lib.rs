// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Stream adapters shared by every writing backend.
pub mod chunker;
/// The uniform data backend contract.
pub mod contract;
/// The composite `(emission_time, event_id)` pagination cursor.
pub mod cursor;
/// The append-only history journal.
pub mod history;
/// The LRS statement-query contract.
pub mod lrs;
/// The per-row projection written to the column store.
pub mod tuple;

pub use chunker::{into_values, peek, write_stream, WriteRecord, WriteStream};
pub use contract::{
    DataBackend, DataBackendStatus, ListItem, ListStream, OperationType, ReadItem, ReadStream,
};
pub use cursor::{format_emission_time, parse_emission_time, row_follows, StatementCursor};
pub use history::{HistoryAction, HistoryEntry, HistoryJournal};
pub use lrs::LrsBackend;
pub use tuple::InsertTuple;
