//! The per-row projection written to the column store.

use chrono::NaiveDateTime;
use lrs_error::{BackendError, BackendResult};
use serde_json::Value;
use uuid::Uuid;

use crate::cursor::parse_emission_time;

/// The four-column projection of a statement.
///
/// `(emission_time, event_id)` is the primary sort key and the basis of
/// the continuation token.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertTuple {
    /// Derived from the statement id.
    pub event_id: Uuid,
    /// Derived from the statement timestamp.
    pub emission_time: NaiveDateTime,
    /// The statement itself.
    pub event: Value,
    /// The statement serialized to a JSON string.
    pub event_str: String,
}

impl InsertTuple {
    /// Project a statement into its insert tuple.
    ///
    /// Rejects records missing `id` or `timestamp` with `BadFormat`; the
    /// projection is deterministic, so a given statement always produces
    /// the same tuple.
    pub fn from_statement(statement: &Value) -> BackendResult<Self> {
        let bad_format = || {
            BackendError::BadFormat(format!(
                "Statement has an invalid or missing id or timestamp field: {statement}"
            ))
        };

        let event_id = statement
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(bad_format)?;
        let emission_time = statement
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|ts| parse_emission_time(ts).ok())
            .ok_or_else(bad_format)?;

        Ok(Self {
            event_id,
            emission_time,
            event: statement.clone(),
            event_str: statement.to_string(),
        })
    }
}
