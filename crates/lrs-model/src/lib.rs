//! Typed xAPI statement model and the LRS query parameter grammar.
//!
//! The statement types mirror the xAPI data model: an actor (agent or
//! group, identified by exactly one inverse-functional identifier), a verb,
//! an object, and optional result, context, and attachments.  The query
//! types define the closed parameter set accepted by
//! [`query_statements`](https://github.com/adlnet/xAPI-Spec) together with
//! its cross-field constraints.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Actor types: agents, groups, and their inverse-functional identifiers.
pub mod actor;
/// Scalar building blocks: IRIs, mailto addresses, language maps.
pub mod common;
/// The LRS statement query parameter model and query results.
pub mod query;
/// Statements and their verb/object/result/context parts.
pub mod statement;

pub use actor::{Account, Actor, Agent, AgentIfi, Group, GroupMembers};
pub use common::{Iri, LanguageMap, LanguageTag, MailtoEmail, OneOrMany, Sha1Hex};
pub use query::{StatementFormat, StatementParameters, StatementQueryResult};
pub use statement::{
    Activity, ActivityDefinition, Attachment, Context, ContextActivities, Score, Statement,
    StatementObject, StatementRef, SubStatement, SubStatementObject, Verb, XapiResult,
};
