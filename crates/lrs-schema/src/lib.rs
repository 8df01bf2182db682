// SPDX-License-Identifier: MIT OR Apache-2.0
#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![warn(missing_docs)]

/// The shape registry and most-specific-match dispatch.
pub mod catalog;
/// Field contracts checked after dispatch.
pub mod contract;
/// Equality constraints on dotted field paths.
pub mod selector;
/// The registered shape definitions.
pub mod shapes;
/// Dispatch-then-check validation of raw records.
pub mod validator;

pub use catalog::{Catalog, Shape};
pub use contract::{Contract, FieldRule, FieldType};
pub use selector::Selector;
pub use validator::{ValidatedStatement, Validator};
