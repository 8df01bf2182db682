//! The LRS statement query parameter model and query results.

use chrono::{DateTime, Utc};
use lrs_error::{BackendError, BackendResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// StatementFormat
// ---------------------------------------------------------------------------

/// Requested statement rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementFormat {
    /// Identifiers only.
    Ids,
    /// Statements exactly as stored.
    #[default]
    Exact,
    /// Canonicalized language maps and definitions.
    Canonical,
}

// ---------------------------------------------------------------------------
// StatementParameters
// ---------------------------------------------------------------------------

/// The closed set of xAPI statement query inputs.
///
/// Construct one with struct-update syntax over [`Default::default`], then
/// call [`StatementParameters::validate`] before handing it to an engine;
/// engines also validate on entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementParameters {
    /// Id of the statement to fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<String>,

    /// Id of the voided statement to fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voided_statement_id: Option<String>,

    /// Actor mailto identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_mbox: Option<String>,

    /// Actor mailto-SHA1 identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_mbox_sha1sum: Option<String>,

    /// Actor OpenID identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_openid: Option<String>,

    /// Actor account name; requires `agent_account_home_page`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_account_name: Option<String>,

    /// Actor account home page; requires `agent_account_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_account_home_page: Option<String>,

    /// Verb IRI to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb: Option<String>,

    /// Activity IRI to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,

    /// Registration UUID to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration: Option<Uuid>,

    /// Widen the activity filter to related activities.
    #[serde(default)]
    pub related_activities: bool,

    /// Widen the agent filter to related agents.
    #[serde(default)]
    pub related_agents: bool,

    /// Only statements strictly after this time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,

    /// Only statements at or before this time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,

    /// Maximum number of statements to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Requested rendering.
    #[serde(default)]
    pub format: StatementFormat,

    /// Include attachment data.
    #[serde(default)]
    pub attachments: bool,

    /// Ascending `(emission_time, event_id)` order.
    #[serde(default)]
    pub ascending: bool,

    /// Continuation token from the previous page's result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_after: Option<String>,

    /// Point-in-time token from the previous page's result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_id: Option<String>,

    /// Authority actor the statements must carry.
    // TODO: narrow to an authority-specific type once the profile
    // documentation settles which identifiers an authority may carry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<Value>,
}

impl StatementParameters {
    /// Check the cross-field constraints of the parameter grammar.
    ///
    /// At most one actor inverse-functional identifier may be supplied,
    /// and the account form requires both the home page and the name.
    pub fn validate(&self) -> BackendResult<()> {
        if self.agent_account_name.is_some() != self.agent_account_home_page.is_some() {
            return Err(BackendError::BadParameter(
                "Invalid agent parameters: homePage and name are both required".to_owned(),
            ));
        }

        let identifiers = [
            self.agent_mbox.is_some(),
            self.agent_mbox_sha1sum.is_some(),
            self.agent_openid.is_some(),
            self.agent_account_name.is_some(),
        ];
        if identifiers.iter().filter(|present| **present).count() > 1 {
            return Err(BackendError::BadParameter(
                "Invalid agent parameters: only one identifier can be used".to_owned(),
            ));
        }

        Ok(())
    }

    /// The account-name form of the agent filter, if present.
    pub fn agent_account_name(&self) -> Option<&str> {
        self.agent_account_name.as_deref()
    }
}

// ---------------------------------------------------------------------------
// StatementQueryResult
// ---------------------------------------------------------------------------

/// One page of a statements query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementQueryResult {
    /// Matching statements, in `(emission_time, event_id)` order.
    pub statements: Vec<Value>,
    /// Emission time of the last returned row, or `None` on an empty page.
    pub continuation_token: Option<String>,
    /// Event id of the last returned row, or `None` on an empty page.
    pub point_in_time: Option<String>,
}
