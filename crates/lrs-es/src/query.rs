//! The Elasticsearch read query model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Read query accepted by the Elasticsearch backend.
///
/// Either a structured search-DSL document or a free-text query string in
/// the Lucene syntax; the free-text form overrides the structured form
/// when both are present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsQuery {
    /// A search definition using the query DSL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,

    /// A Lucene query string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
}
