//! Actor types: agents, groups, and inverse-functional identifiers.

use crate::common::{Iri, MailtoEmail, Sha1Hex};
use lrs_error::{ValidationFailure, ValidationKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The keys that act as inverse-functional identifiers on the wire.
const IFI_KEYS: [&str; 4] = ["mbox", "mbox_sha1sum", "openid", "account"];

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// An account on a named service provider.
///
/// Both fields are required: an account without a home page (or without a
/// name) does not identify anyone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Home page of the account's service provider.
    #[serde(rename = "homePage")]
    pub home_page: Iri,
    /// Unique id or name of the actor's account on that provider.
    pub name: String,
}

// ---------------------------------------------------------------------------
// AgentIfi
// ---------------------------------------------------------------------------

/// Exactly one inverse-functional identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentIfi {
    /// A `mailto:` email IRI.
    Mbox {
        /// The agent's email address.
        mbox: MailtoEmail,
    },
    /// The SHA-1 hash of a mailto IRI.
    MboxSha1Sum {
        /// Lowercase hex digest.
        mbox_sha1sum: Sha1Hex,
    },
    /// An OpenID URL.
    Openid {
        /// The identifying URL.
        openid: Iri,
    },
    /// An account on a service provider.
    Account {
        /// Home page and account name.
        account: Account,
    },
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An individual actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Optional `"Agent"` discriminator.
    #[serde(rename = "objectType", default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Full name of the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The agent's single inverse-functional identifier.
    #[serde(flatten)]
    pub ifi: AgentIfi,
}

impl Agent {
    /// Deserialize an agent from a raw record, enforcing that exactly one
    /// inverse-functional identifier is present.
    ///
    /// Untagged deserialization alone would accept a record carrying two
    /// identifiers by silently dropping one; the wire contract forbids it.
    pub fn from_value(value: &Value) -> Result<Self, ValidationFailure> {
        check_single_ifi(value)?;
        serde_json::from_value(value.clone()).map_err(|err| {
            ValidationFailure::record(ValidationKind::WrongType, err.to_string())
        })
    }
}

/// Count IFI keys on a raw actor object and fail unless there is one.
pub(crate) fn check_single_ifi(value: &Value) -> Result<(), ValidationFailure> {
    let Some(object) = value.as_object() else {
        return Err(ValidationFailure::record(
            ValidationKind::WrongType,
            "actor must be an object",
        ));
    };
    let count = IFI_KEYS.iter().filter(|key| object.contains_key(**key)).count();
    match count {
        1 => Ok(()),
        0 => Err(ValidationFailure::record(
            ValidationKind::MissingRequired,
            "actor requires an inverse-functional identifier",
        )),
        _ => Err(ValidationFailure::record(
            ValidationKind::OutOfRange,
            "only one identifier can be used",
        )),
    }
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// Member list carried by a group.
pub type GroupMembers = Vec<Agent>;

/// A group actor, anonymous or identified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    /// Required `"Group"` discriminator.
    #[serde(rename = "objectType")]
    pub object_type: String,
    /// Full name of the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The group's identifier; absent for anonymous groups.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub ifi: Option<AgentIfi>,
    /// Members of the group.
    ///
    /// Required for anonymous groups, optional for identified ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<GroupMembers>,
}

// Hand-written: a flattened `Option<AgentIfi>` would reject anonymous
// groups, whose remaining fields match no identifier variant.
impl<'de> Deserialize<'de> for Group {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let value = Value::deserialize(deserializer)?;
        let object = value
            .as_object()
            .ok_or_else(|| D::Error::custom("group must be an object"))?;
        if object.get("objectType").and_then(Value::as_str) != Some("Group") {
            return Err(D::Error::custom("group requires objectType \"Group\""));
        }
        let name = match object.get("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(_) => return Err(D::Error::custom("group name must be a string")),
        };
        let has_ifi = IFI_KEYS.iter().any(|key| object.contains_key(*key));
        let ifi = if has_ifi {
            Some(serde_json::from_value(value.clone()).map_err(D::Error::custom)?)
        } else {
            None
        };
        let member = match object.get("member") {
            None | Some(Value::Null) => None,
            Some(members) => {
                Some(serde_json::from_value(members.clone()).map_err(D::Error::custom)?)
            }
        };
        Ok(Self {
            object_type: "Group".to_owned(),
            name,
            ifi,
            member,
        })
    }
}

impl Group {
    /// Deserialize a group from a raw record, enforcing the anonymous /
    /// identified split: an anonymous group must carry members, an
    /// identified group exactly one identifier.
    pub fn from_value(value: &Value) -> Result<Self, ValidationFailure> {
        let Some(object) = value.as_object() else {
            return Err(ValidationFailure::record(
                ValidationKind::WrongType,
                "group must be an object",
            ));
        };
        let ifi_count = IFI_KEYS.iter().filter(|key| object.contains_key(**key)).count();
        match ifi_count {
            0 if !object.contains_key("member") => {
                return Err(ValidationFailure::record(
                    ValidationKind::MissingRequired,
                    "anonymous group requires a member list",
                ));
            }
            0 | 1 => {}
            _ => {
                return Err(ValidationFailure::record(
                    ValidationKind::OutOfRange,
                    "only one identifier can be used",
                ));
            }
        }
        serde_json::from_value(value.clone()).map_err(|err| {
            ValidationFailure::record(ValidationKind::WrongType, err.to_string())
        })
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// An agent or a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actor {
    /// A group (distinguished by `objectType: "Group"`).
    Group(Group),
    /// An individual agent.
    Agent(Agent),
}

impl Actor {
    /// Deserialize an actor, routing on the `objectType` discriminator and
    /// enforcing the identifier invariants.
    pub fn from_value(value: &Value) -> Result<Self, ValidationFailure> {
        let object_type = value.get("objectType").and_then(Value::as_str);
        if object_type == Some("Group") {
            Group::from_value(value).map(Actor::Group)
        } else {
            Agent::from_value(value).map(Actor::Agent)
        }
    }
}
