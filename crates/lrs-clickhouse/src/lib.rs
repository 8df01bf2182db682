//! Column-store data and LRS backend over the ClickHouse HTTP interface.
//!
//! The driver is plain HTTP and stateless: every call is one request
//! carrying the SQL in the `query` parameter, values bound through the
//! server's `param_*` substitution mechanism, and `JSONEachRow` as the
//! wire format.  No query fragment is ever concatenated from untrusted
//! input.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod query;

pub use backend::ClickHouseDataBackend;
pub use query::ClickHouseQuery;
