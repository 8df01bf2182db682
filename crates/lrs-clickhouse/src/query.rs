//! The ClickHouse read query model.

use serde::{Deserialize, Serialize};

/// Read query accepted by the ClickHouse backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickHouseQuery {
    /// Raw `WHERE` fragment appended to the read statement.
    ///
    /// Caller-supplied SQL; reads are bounded and the fragment never
    /// carries end-user input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    /// Columns to select instead of the default `event`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_fields: Option<Vec<String>>,
}
