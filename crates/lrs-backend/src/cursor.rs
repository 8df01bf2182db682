//! The composite `(emission_time, event_id)` pagination cursor.
//!
//! A timestamp alone cannot resume a scan: many rows may share one.  The
//! cursor therefore carries both halves of the primary sort key, and every
//! LRS engine translates the pair into its native dialect with the same
//! comparison:
//!
//! ```text
//! (emission_time OP search_after)
//!   OR (emission_time = search_after AND event_id OP pit_id)
//! ```
//!
//! where `OP` is `>` when ascending and `<` otherwise.

use chrono::NaiveDateTime;
use lrs_error::{BackendError, BackendResult};
use uuid::Uuid;

/// Format used for the `search_after` half: ISO-8601 with microseconds.
const EMISSION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

// ---------------------------------------------------------------------------
// StatementCursor
// ---------------------------------------------------------------------------

/// The two halves of the composite pagination cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementCursor {
    /// Emission time of the last returned row, ISO-8601 with microseconds.
    pub search_after: String,
    /// Event id of the last returned row.
    pub pit_id: String,
}

impl StatementCursor {
    /// Build the cursor emitted after a page ending at `(emission_time,
    /// event_id)`.
    pub fn from_last_row(emission_time: NaiveDateTime, event_id: Uuid) -> Self {
        Self {
            search_after: emission_time.format(EMISSION_TIME_FORMAT).to_string(),
            pit_id: event_id.to_string(),
        }
    }

    /// Parse the caller-supplied `(search_after, pit_id)` pair back into
    /// the sort key.
    pub fn parse(search_after: &str, pit_id: &str) -> BackendResult<(NaiveDateTime, Uuid)> {
        let emission_time = parse_emission_time(search_after)?;
        let event_id = Uuid::parse_str(pit_id).map_err(|err| {
            BackendError::BadParameter(format!("invalid pit_id '{pit_id}': {err}"))
        })?;
        Ok((emission_time, event_id))
    }
}

/// Format an emission time the way the continuation token carries it.
pub fn format_emission_time(emission_time: NaiveDateTime) -> String {
    emission_time.format(EMISSION_TIME_FORMAT).to_string()
}

/// Parse an emission time in any of the shapes statements carry: RFC-3339
/// with an offset, or a naive ISO-8601 date-time.
pub fn parse_emission_time(value: &str) -> BackendResult<NaiveDateTime> {
    if let Ok(with_offset) = chrono::DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, EMISSION_TIME_FORMAT).map_err(|err| {
        BackendError::BadParameter(format!("invalid timestamp '{value}': {err}"))
    })
}

/// The composite comparison every dialect translation mirrors.
///
/// Returns `true` when `row` comes strictly after `cursor` in the chosen
/// direction.
pub fn row_follows(
    cursor: (NaiveDateTime, Uuid),
    row: (NaiveDateTime, Uuid),
    ascending: bool,
) -> bool {
    if ascending {
        row > cursor
    } else {
        row < cursor
    }
}
