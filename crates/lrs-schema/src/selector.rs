//! Equality constraints on dotted field paths.

use serde_json::Value;
use std::collections::BTreeMap;

/// Resolve a dotted path (`"object.definition.type"`) inside a record.
pub(crate) fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = record;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// A set of `(dotted path, expected literal)` constraints.
///
/// A record matches when every constraint holds.  Two selectors are
/// ordered by strict superset of their constraint sets; the catalog uses
/// that ordering to pick the most specific matching shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    constraints: BTreeMap<String, String>,
}

impl Selector {
    /// Build a selector from `(path, literal)` pairs.
    pub fn new<P, L>(constraints: impl IntoIterator<Item = (P, L)>) -> Self
    where
        P: Into<String>,
        L: Into<String>,
    {
        Self {
            constraints: constraints
                .into_iter()
                .map(|(path, literal)| (path.into(), literal.into()))
                .collect(),
        }
    }

    /// The constraint pairs, ordered by path.
    pub fn constraints(&self) -> impl Iterator<Item = (&str, &str)> {
        self.constraints
            .iter()
            .map(|(path, literal)| (path.as_str(), literal.as_str()))
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether the selector is unconstrained.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// `true` when every constraint holds on `record`.
    pub fn matches(&self, record: &Value) -> bool {
        self.constraints.iter().all(|(path, literal)| {
            lookup(record, path).and_then(Value::as_str) == Some(literal.as_str())
        })
    }

    /// `true` when `self`'s constraint set strictly contains `other`'s.
    pub fn is_strict_superset_of(&self, other: &Self) -> bool {
        self.constraints.len() > other.constraints.len()
            && other
                .constraints
                .iter()
                .all(|(path, literal)| self.constraints.get(path) == Some(literal))
    }

    /// `true` when the two constraint sets are ordered (equal, subset, or
    /// superset).  Incomparable selectors that both match a record make
    /// dispatch ambiguous.
    pub fn is_comparable_to(&self, other: &Self) -> bool {
        self == other || self.is_strict_superset_of(other) || other.is_strict_superset_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> Selector {
        Selector::new([("event_source", "server")])
    }

    fn peer_assess() -> Selector {
        Selector::new([
            ("event_source", "server"),
            ("event_type", "openassessmentblock.peer_assess"),
        ])
    }

    #[test]
    fn matches_requires_every_constraint() {
        let record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.peer_assess"
        });
        assert!(server().matches(&record));
        assert!(peer_assess().matches(&record));
        assert!(!peer_assess().matches(&json!({"event_source": "server"})));
    }

    #[test]
    fn dotted_paths_traverse_nesting() {
        let selector = Selector::new([(
            "object.definition.type",
            "http://adlnet.gov/expapi/activities/cmi.interaction",
        )]);
        let record = json!({
            "object": {"definition": {
                "type": "http://adlnet.gov/expapi/activities/cmi.interaction"
            }}
        });
        assert!(selector.matches(&record));
        assert!(!selector.matches(&json!({"object": {}})));
    }

    #[test]
    fn superset_ordering_is_strict() {
        assert!(peer_assess().is_strict_superset_of(&server()));
        assert!(!server().is_strict_superset_of(&peer_assess()));
        assert!(!peer_assess().is_strict_superset_of(&peer_assess()));
    }

    #[test]
    fn disjoint_selectors_are_incomparable() {
        let browser = Selector::new([("event_source", "browser")]);
        assert!(!server().is_comparable_to(&browser));
        assert!(server().is_comparable_to(&peer_assess()));
    }

    #[test]
    fn constraint_on_same_path_with_other_literal_is_not_subsumed() {
        let self_assess = Selector::new([
            ("event_source", "server"),
            ("event_type", "openassessmentblock.self_assess"),
        ]);
        assert!(!peer_assess().is_strict_superset_of(&self_assess));
        assert!(!self_assess.is_comparable_to(&peer_assess()));
    }
}
