//! Statements and their verb/object/result/context parts.

use crate::actor::{Actor, Agent, Group};
use crate::common::{Iri, LanguageMap, OneOrMany};
use chrono::{DateTime, Utc};
use lrs_error::{ValidationFailure, ValidationKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Extension maps are keyed by IRI and open by construction.
pub type Extensions = BTreeMap<Iri, Value>;

// ---------------------------------------------------------------------------
// Verb
// ---------------------------------------------------------------------------

/// The action performed by the actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verb {
    /// Verb identifier.
    pub id: Iri,
    /// Language-tagged display map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<LanguageMap>,
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

/// Typed definition attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    /// Human-readable activity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<LanguageMap>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LanguageMap>,
    /// Activity type IRI.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<Iri>,
    /// Further documentation URL.
    #[serde(rename = "moreInfo", default, skip_serializing_if = "Option::is_none")]
    pub more_info: Option<Iri>,
    /// Open extension map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

/// The thing the statement is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Optional `"Activity"` discriminator.
    #[serde(rename = "objectType", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Activity identifier.
    pub id: Iri,
    /// Typed definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<ActivityDefinition>,
}

// ---------------------------------------------------------------------------
// StatementRef
// ---------------------------------------------------------------------------

/// A reference to another statement by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRef {
    /// Required `"StatementRef"` discriminator.
    #[serde(rename = "objectType")]
    pub object_type: String,
    /// Id of the referenced statement.
    pub id: Uuid,
}

// ---------------------------------------------------------------------------
// SubStatement
// ---------------------------------------------------------------------------

/// Objects permitted inside a sub-statement.
///
/// A sub-statement may not itself contain a sub-statement; the variant is
/// absent from this enum, making the one-level nesting limit structural.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubStatementObject {
    /// A statement reference.
    StatementRef(StatementRef),
    /// A group.
    Group(Group),
    /// An activity.
    Activity(Activity),
    /// An agent.
    Agent(Agent),
}

/// A statement nested as the object of another statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubStatement {
    /// Required `"SubStatement"` discriminator.
    #[serde(rename = "objectType")]
    pub object_type: String,
    /// Who performed the nested action.
    pub actor: Actor,
    /// The nested action.
    pub verb: Verb,
    /// The nested object.
    pub object: SubStatementObject,
    /// Outcome of the nested action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<XapiResult>,
    /// Context of the nested action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// When the nested action occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// StatementObject
// ---------------------------------------------------------------------------

/// The object of a statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatementObject {
    /// A nested statement.
    SubStatement(SubStatement),
    /// A reference to another statement.
    StatementRef(StatementRef),
    /// A group.
    Group(Group),
    /// An activity.
    Activity(Activity),
    /// An agent.
    Agent(Agent),
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A scaled/raw/min/max score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Score normalized to `[-1, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaled: Option<f64>,
    /// Raw score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<f64>,
    /// Minimum possible raw score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum possible raw score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Score {
    /// Check the range invariants (`scaled` within `[-1, 1]`, `raw` within
    /// `[min, max]` where given).
    pub fn check(&self) -> Result<(), ValidationFailure> {
        if let Some(scaled) = self.scaled
            && !(-1.0..=1.0).contains(&scaled)
        {
            return Err(ValidationFailure::new(
                "result.score.scaled",
                ValidationKind::OutOfRange,
                format!("{scaled} is outside [-1, 1]"),
            ));
        }
        if let (Some(raw), Some(min)) = (self.raw, self.min)
            && raw < min
        {
            return Err(ValidationFailure::new(
                "result.score.raw",
                ValidationKind::OutOfRange,
                format!("{raw} is below the declared minimum {min}"),
            ));
        }
        if let (Some(raw), Some(max)) = (self.raw, self.max)
            && raw > max
        {
            return Err(ValidationFailure::new(
                "result.score.raw",
                ValidationKind::OutOfRange,
                format!("{raw} is above the declared maximum {max}"),
            ));
        }
        Ok(())
    }
}

/// Outcome of the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XapiResult {
    /// Score achieved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
    /// Whether the actor succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Whether the activity was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<bool>,
    /// Actor-supplied response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// ISO-8601 duration over which the result occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Open extension map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// The four context-activity categories; each accepts a single activity or
/// a list on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextActivities {
    /// Direct parents of the statement's activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<OneOrMany<Activity>>,
    /// Activities the statement's activity is grouped with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<OneOrMany<Activity>>,
    /// Profiles or categories the statement falls under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<OneOrMany<Activity>>,
    /// Any other contextual relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<OneOrMany<Activity>>,
}

/// Context in which the action occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Registration the statement is part of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<Uuid>,
    /// Instructor involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Actor>,
    /// Team the actor acted within.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Group>,
    /// Related activities by category.
    #[serde(rename = "contextActivities", default, skip_serializing_if = "Option::is_none")]
    pub context_activities: Option<ContextActivities>,
    /// Revision of the learning activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Platform the experience occurred on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Language of the experience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Another statement giving context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement: Option<StatementRef>,
    /// Open extension map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>,
}

// ---------------------------------------------------------------------------
// Attachment
// ---------------------------------------------------------------------------

/// Metadata for a binary attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Usage type IRI.
    #[serde(rename = "usageType")]
    pub usage_type: Iri,
    /// Display name.
    pub display: LanguageMap,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LanguageMap>,
    /// Content type of the attached data.
    #[serde(rename = "contentType")]
    pub content_type: String,
    /// Length of the attached data in bytes.
    pub length: u64,
    /// SHA-2 hash of the attached data.
    pub sha2: String,
    /// Where the attachment can be fetched.
    #[serde(rename = "fileUrl", default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<Iri>,
}

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// An immutable xAPI statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Statement id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Who performed the action.
    pub actor: Actor,
    /// The action performed.
    pub verb: Verb,
    /// What the action was performed on.
    pub object: StatementObject,
    /// Outcome of the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<XapiResult>,
    /// Context of the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    /// When the action occurred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// When the LRS stored the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<DateTime<Utc>>,
    /// Who asserts the statement is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<Actor>,
    /// xAPI version the statement conforms to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Attachment metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
}

impl Statement {
    /// Deserialize a statement from a raw record, running the invariants
    /// serde cannot express (single IFI per actor, score ranges).
    pub fn from_value(value: &Value) -> Result<Self, ValidationFailure> {
        let actor = value.get("actor").ok_or_else(|| {
            ValidationFailure::new("actor", ValidationKind::MissingRequired, "actor is required")
        })?;
        Actor::from_value(actor)?;

        let statement: Self = serde_json::from_value(value.clone()).map_err(|err| {
            ValidationFailure::record(ValidationKind::WrongType, err.to_string())
        })?;
        if let Some(score) = statement.result.as_ref().and_then(|r| r.score.as_ref()) {
            score.check()?;
        }
        Ok(statement)
    }
}
