//! Document-store data and LRS backend over MongoDB.
//!
//! Statements are stored as `{_id: ObjectId, _source: <statement>}`
//! documents.  The driver is connection-pooled and safe for concurrent
//! use; every read and write suspends at awaited I/O, so a caller's
//! scheduler may interleave other tasks at those points.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod query;

pub use backend::MongoDataBackend;
pub use query::MongoQuery;
