//! Field contracts checked after dispatch.
//!
//! A contract is a flat list of rules over dotted paths plus a list of
//! closed boundaries.  Checking stops at the first offending path, which
//! becomes the [`ValidationFailure`]'s location.

use chrono::DateTime;
use lrs_error::{ValidationFailure, ValidationKind};
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::selector::lookup;

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// The JSON shape a field must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Any string.
    Str,
    /// An integer.
    Int,
    /// Any number.
    Number,
    /// A boolean.
    Bool,
    /// A JSON object.
    Object,
    /// A JSON array.
    Array,
    /// A string holding a UUID.
    Uuid,
    /// A string holding an RFC-3339 / ISO-8601 date-time.
    DateTime,
    /// A JSON object, or a string that parses to one.
    ///
    /// Tracking pipelines double-encode some event payloads.
    JsonObject,
}

impl FieldType {
    fn check(self, value: &Value) -> bool {
        match self {
            Self::Str => value.is_string(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::Uuid => value
                .as_str()
                .is_some_and(|s| Uuid::parse_str(s).is_ok()),
            Self::DateTime => value.as_str().is_some_and(|s| {
                DateTime::parse_from_rfc3339(s).is_ok()
                    || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            }),
            Self::JsonObject => match value {
                Value::Object(_) => true,
                Value::String(raw) => {
                    serde_json::from_str::<Value>(raw).is_ok_and(|parsed| parsed.is_object())
                }
                _ => false,
            },
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Str => "a string",
            Self::Int => "an integer",
            Self::Number => "a number",
            Self::Bool => "a boolean",
            Self::Object => "an object",
            Self::Array => "an array",
            Self::Uuid => "a UUID string",
            Self::DateTime => "a date-time string",
            Self::JsonObject => "an object or a JSON-encoded object",
        }
    }
}

// ---------------------------------------------------------------------------
// FieldRule
// ---------------------------------------------------------------------------

/// One constraint on one dotted path.
#[derive(Debug, Clone)]
pub struct FieldRule {
    path: String,
    field_type: FieldType,
    required: bool,
    nullable: bool,
    literal: Option<String>,
    one_of: Option<Vec<String>>,
    pattern: Option<Regex>,
    max_length: Option<usize>,
}

impl FieldRule {
    /// A required field of `field_type` at `path`.
    pub fn required(path: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            path: path.into(),
            field_type,
            required: true,
            nullable: false,
            literal: None,
            one_of: None,
            pattern: None,
            max_length: None,
        }
    }

    /// An optional field of `field_type` at `path`.
    pub fn optional(path: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(path, field_type)
        }
    }

    /// Accept an explicit `null` in place of the typed value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Constrain the field to a single literal.
    pub fn literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = Some(literal.into());
        self
    }

    /// Constrain the field to one of the given literals.
    pub fn one_of(mut self, literals: impl IntoIterator<Item = &'static str>) -> Self {
        self.one_of = Some(literals.into_iter().map(str::to_owned).collect());
        self
    }

    /// Constrain the field to match `pattern`.
    ///
    /// # Panics
    ///
    /// Panics on an invalid pattern; rules are built from static
    /// registration data at startup.
    pub fn matching(mut self, pattern: &str) -> Self {
        self.pattern = Some(Regex::new(pattern).expect("valid shape pattern"));
        self
    }

    /// Cap the field's string length.
    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    fn check(&self, record: &Value) -> Result<(), ValidationFailure> {
        let Some(value) = lookup(record, &self.path) else {
            if self.required {
                return Err(ValidationFailure::new(
                    &self.path,
                    ValidationKind::MissingRequired,
                    "field is required",
                ));
            }
            return Ok(());
        };

        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(ValidationFailure::new(
                &self.path,
                ValidationKind::WrongType,
                format!("expected {}, found null", self.field_type.expected()),
            ));
        }

        if !self.field_type.check(value) {
            return Err(ValidationFailure::new(
                &self.path,
                ValidationKind::WrongType,
                format!("expected {}", self.field_type.expected()),
            ));
        }

        if let Some(literal) = &self.literal
            && value.as_str() != Some(literal.as_str())
        {
            return Err(ValidationFailure::new(
                &self.path,
                ValidationKind::UnexpectedLiteral,
                format!("expected literal '{literal}'"),
            ));
        }

        if let Some(literals) = &self.one_of
            && !value
                .as_str()
                .is_some_and(|s| literals.iter().any(|l| l == s))
        {
            return Err(ValidationFailure::new(
                &self.path,
                ValidationKind::UnexpectedLiteral,
                format!("expected one of {literals:?}"),
            ));
        }

        if let (Some(pattern), Some(s)) = (&self.pattern, value.as_str())
            && !pattern.is_match(s)
        {
            return Err(ValidationFailure::new(
                &self.path,
                ValidationKind::RegexMismatch,
                format!("'{s}' does not match {pattern}"),
            ));
        }

        if let (Some(max), Some(s)) = (self.max_length, value.as_str())
            && s.chars().count() > max
        {
            return Err(ValidationFailure::new(
                &self.path,
                ValidationKind::OutOfRange,
                format!("length exceeds {max}"),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// A closed object boundary: only the listed keys may appear.
#[derive(Debug, Clone)]
struct ClosedBoundary {
    path: String,
    allowed: Vec<String>,
}

/// The field contract of one shape.
#[derive(Debug, Clone, Default)]
pub struct Contract {
    rules: Vec<FieldRule>,
    closed: Vec<ClosedBoundary>,
    defaults: Vec<(String, Value)>,
}

impl Contract {
    /// An empty (fully open) contract.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field rule.
    pub fn rule(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Mark the object at `path` closed, allowing only `keys`.
    ///
    /// The empty path closes the record root.  Open boundaries —
    /// extension maps in particular — are simply never closed.
    pub fn closed(
        mut self,
        path: impl Into<String>,
        keys: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        self.closed.push(ClosedBoundary {
            path: path.into(),
            allowed: keys.into_iter().map(str::to_owned).collect(),
        });
        self
    }

    /// Substitute `value` at `path` when the field is absent.
    pub fn default_value(mut self, path: impl Into<String>, value: Value) -> Self {
        self.defaults.push((path.into(), value));
        self
    }

    /// Apply declared defaults to `record`, returning the filled copy.
    pub fn apply_defaults(&self, record: &Value) -> Value {
        let mut filled = record.clone();
        for (path, default) in &self.defaults {
            if lookup(&filled, path).is_some() {
                continue;
            }
            let (parent_path, key) = match path.rsplit_once('.') {
                Some((parent, key)) => (Some(parent), key),
                None => (None, path.as_str()),
            };
            let parent = match parent_path {
                None => Some(&mut filled),
                Some(parent_path) => lookup_mut(&mut filled, parent_path),
            };
            if let Some(Value::Object(object)) = parent {
                object.insert(key.to_owned(), default.clone());
            }
        }
        filled
    }

    /// Check `record`, reporting the first offending path.
    pub fn check(&self, record: &Value) -> Result<(), ValidationFailure> {
        for rule in &self.rules {
            rule.check(record)?;
        }
        for boundary in &self.closed {
            let value = if boundary.path.is_empty() {
                Some(record)
            } else {
                lookup(record, &boundary.path)
            };
            let Some(Value::Object(object)) = value else {
                continue;
            };
            for key in object.keys() {
                if !boundary.allowed.iter().any(|allowed| allowed == key) {
                    let path = if boundary.path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{key}", boundary.path)
                    };
                    return Err(ValidationFailure::new(
                        path,
                        ValidationKind::UnknownField,
                        "field is not declared by the shape",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn lookup_mut<'a>(record: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object_mut()?.get_mut(segment)?;
    }
    Some(current)
}
