//! Scalar building blocks shared by the statement types.

use lrs_error::{ValidationFailure, ValidationKind};
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

// The scalar newtypes validate on construction AND on deserialization;
// a statement parsed through serde carries the same guarantees as one
// built through the constructors.
macro_rules! validating_deserialize {
    ($type:ty) => {
        impl<'de> Deserialize<'de> for $type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(D::Error::custom)
            }
        }
    };
}

static SHA1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("valid regex"));

static MAILTO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mailto:[^@\s]+@[^@\s]+$").expect("valid regex"));

// Well-formedness only (language, script, region, variants); registry
// validity is out of scope.
static BCP47_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{2,8}(-[A-Za-z0-9]{1,8})*$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Iri
// ---------------------------------------------------------------------------

/// An Internationalized Resource Identifier.
///
/// xAPI identifiers (verbs, activities, extension keys) are IRIs; the only
/// structural requirement enforced here is the presence of a scheme.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Iri(String);

validating_deserialize!(Iri);

impl Iri {
    /// Parse a string as an IRI.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationFailure> {
        let value = value.into();
        let scheme_ok = value
            .split_once(':')
            .is_some_and(|(scheme, rest)| !scheme.is_empty() && !rest.is_empty());
        if !scheme_ok {
            return Err(ValidationFailure::record(
                ValidationKind::RegexMismatch,
                format!("'{value}' is not a valid IRI"),
            ));
        }
        Ok(Self(value))
    }

    /// The IRI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Iri {
    type Err = ValidationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// MailtoEmail
// ---------------------------------------------------------------------------

/// A `mailto:` IRI identifying an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MailtoEmail(String);

validating_deserialize!(MailtoEmail);

impl MailtoEmail {
    /// Parse a `mailto:user@example.com` identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationFailure> {
        let value = value.into();
        if !MAILTO_RE.is_match(&value) {
            return Err(ValidationFailure::record(
                ValidationKind::RegexMismatch,
                format!("'{value}' is not a valid mailto IRI"),
            ));
        }
        Ok(Self(value))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Sha1Hex
// ---------------------------------------------------------------------------

/// The SHA-1 hash of a mailto IRI, as 40 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha1Hex(String);

validating_deserialize!(Sha1Hex);

impl Sha1Hex {
    /// Parse a 40-digit lowercase hex string.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationFailure> {
        let value = value.into();
        if !SHA1_RE.is_match(&value) {
            return Err(ValidationFailure::record(
                ValidationKind::RegexMismatch,
                format!("'{value}' is not a valid mbox SHA1 sum"),
            ));
        }
        Ok(Self(value))
    }

    /// The hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Language tags and maps
// ---------------------------------------------------------------------------

/// A well-formed BCP-47 language tag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LanguageTag(String);

validating_deserialize!(LanguageTag);

impl LanguageTag {
    /// Parse a language tag, checking well-formedness.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationFailure> {
        let value = value.into();
        if !BCP47_RE.is_match(&value) {
            return Err(ValidationFailure::record(
                ValidationKind::RegexMismatch,
                format!("'{value}' is not a well-formed BCP-47 tag"),
            ));
        }
        Ok(Self(value))
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A map from language tag to display string.
pub type LanguageMap = BTreeMap<LanguageTag, String>;

/// Build a single-entry language map.
pub fn language_map(tag: &str, display: &str) -> Result<LanguageMap, ValidationFailure> {
    let mut map = LanguageMap::new();
    map.insert(LanguageTag::new(tag)?, display.to_owned());
    Ok(map)
}

// ---------------------------------------------------------------------------
// OneOrMany
// ---------------------------------------------------------------------------

/// A field that serializes as either a single value or a list.
///
/// Context activity categories accept both forms on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// A list of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Iterate the contained values.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        match self {
            Self::One(value) => std::slice::from_ref(value).iter(),
            Self::Many(values) => values.iter(),
        }
    }
}
