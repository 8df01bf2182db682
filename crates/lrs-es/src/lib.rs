//! Search-cluster data and LRS backend over the Elasticsearch REST API.
//!
//! Reads scan the target index with the scroll API; writes stream
//! newline-delimited actions through `_bulk`, shaping each action for the
//! requested operation type.  The LRS engine sorts on
//! `(timestamp, id)` and maps the composite cursor onto the cluster's
//! `search_after` mechanism.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod query;

pub use backend::EsDataBackend;
pub use query::EsQuery;
