//! The MongoDB read query model.

use bson::Document;
use serde::{Deserialize, Serialize};

/// Read query accepted by the MongoDB backend.
///
/// The fields mirror the driver's `find` arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MongoQuery {
    /// Filter document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Document>,

    /// Sort document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Document>,

    /// Maximum number of documents to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}
