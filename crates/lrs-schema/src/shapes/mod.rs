//! The registered shape definitions.
//!
//! Shapes are data: each module contributes one family to a catalog via
//! its `register` function.

/// edX tracking-event shapes (Open Response Assessment family).
pub mod edx;
/// xAPI statement shapes.
pub mod xapi;
