//! The shape registry and most-specific-match dispatch.

use lrs_error::{ValidationFailure, ValidationKind};
use serde_json::Value;
use tracing::debug;

use crate::contract::Contract;
use crate::selector::Selector;
use crate::shapes;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// One registered statement shape.
#[derive(Debug, Clone)]
pub struct Shape {
    name: &'static str,
    selector: Selector,
    contract: Contract,
}

impl Shape {
    /// Define a shape.
    pub fn new(name: &'static str, selector: Selector, contract: Contract) -> Self {
        Self {
            name,
            selector,
            contract,
        }
    }

    /// Registration name of the shape.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The shape's selector.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// The shape's field contract.
    pub fn contract(&self) -> &Contract {
        &self.contract
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The immutable registry of statement shapes.
///
/// Populated once at startup from the static registration list; dispatch
/// is deterministic as long as registered selectors form a forest under
/// the strict-superset ordering.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    shapes: Vec<Shape>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog of edX tracking-event shapes.
    ///
    /// Tracking events and xAPI statements constrain disjoint field
    /// paths, so each family gets its own catalog; mixing them would
    /// break the forest property dispatch relies on.
    pub fn edx() -> Self {
        let mut catalog = Self::new();
        shapes::edx::register(&mut catalog);
        catalog
    }

    /// The catalog of xAPI statement shapes.
    pub fn xapi() -> Self {
        let mut catalog = Self::new();
        shapes::xapi::register(&mut catalog);
        catalog
    }

    /// Register a shape.
    pub fn register(&mut self, shape: Shape) {
        debug!(shape = shape.name(), "registering statement shape");
        self.shapes.push(shape);
    }

    /// The registered shapes, in registration order.
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Return the unique most-specific shape matching `record`.
    ///
    /// Fails with `NoMatchingShape` when nothing matches and with
    /// `AmbiguousShape` when two incomparable shapes both match.
    pub fn dispatch(&self, record: &Value) -> Result<&Shape, ValidationFailure> {
        let matching: Vec<&Shape> = self
            .shapes
            .iter()
            .filter(|shape| shape.selector.matches(record))
            .collect();

        if matching.is_empty() {
            return Err(ValidationFailure::record(
                ValidationKind::NoMatchingShape,
                "no registered shape matches the record",
            ));
        }

        // Keep the maximal shapes under the strict-superset ordering.
        let maximal: Vec<&Shape> = matching
            .iter()
            .filter(|candidate| {
                !matching.iter().any(|other| {
                    other.selector.is_strict_superset_of(&candidate.selector)
                })
            })
            .copied()
            .collect();

        match maximal.as_slice() {
            [unique] => Ok(unique),
            [first, second, ..] => Err(ValidationFailure::record(
                ValidationKind::AmbiguousShape,
                format!(
                    "record matches incomparable shapes '{}' and '{}'",
                    first.name, second.name
                ),
            )),
            [] => unreachable!("a non-empty match set has a maximal element"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Contract, FieldRule, FieldType};
    use serde_json::json;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.register(Shape::new(
            "server",
            Selector::new([("event_source", "server")]),
            Contract::new(),
        ));
        catalog.register(Shape::new(
            "server.peer_assess",
            Selector::new([
                ("event_source", "server"),
                ("event_type", "openassessmentblock.peer_assess"),
            ]),
            Contract::new().rule(FieldRule::required("event", FieldType::Object)),
        ));
        catalog
    }

    #[test]
    fn dispatch_picks_the_most_specific_shape() {
        let record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.peer_assess",
            "event": {}
        });
        let shape = catalog().dispatch(&record).unwrap();
        assert_eq!(shape.name(), "server.peer_assess");
    }

    #[test]
    fn dispatch_falls_back_to_the_parent_shape() {
        let record = json!({
            "event_source": "server",
            "event_type": "something.else"
        });
        let shape = catalog().dispatch(&record).unwrap();
        assert_eq!(shape.name(), "server");
    }

    #[test]
    fn dispatch_reports_no_match() {
        let err = catalog().dispatch(&json!({"event_source": "browser"})).unwrap_err();
        assert_eq!(err.kind, lrs_error::ValidationKind::NoMatchingShape);
    }

    #[test]
    fn incomparable_matching_shapes_are_ambiguous() {
        let mut catalog = catalog();
        catalog.register(Shape::new(
            "x-module-pages",
            Selector::new([("page", "x_module")]),
            Contract::new(),
        ));
        let record = json!({
            "event_source": "server",
            "page": "x_module"
        });
        let err = catalog.dispatch(&record).unwrap_err();
        assert_eq!(err.kind, lrs_error::ValidationKind::AmbiguousShape);
    }

    // Two shapes that can match the same record must be ordered by
    // specificity; a pair conflicting on a shared path can never
    // co-match and is allowed to stay incomparable.
    fn assert_forest(catalog: &Catalog) {
        let shapes = catalog.shapes();
        assert!(!shapes.is_empty());
        for (i, a) in shapes.iter().enumerate() {
            for b in shapes.iter().skip(i + 1) {
                let joint_matchable = a.selector().constraints().all(|(path, literal)| {
                    b.selector()
                        .constraints()
                        .all(|(other_path, other_literal)| {
                            path != other_path || literal == other_literal
                        })
                });
                if joint_matchable {
                    assert!(
                        a.selector().is_comparable_to(b.selector()),
                        "shapes '{}' and '{}' can both match a record but are incomparable",
                        a.name(),
                        b.name()
                    );
                }
            }
        }
    }

    #[test]
    fn edx_catalog_selectors_form_a_forest() {
        assert_forest(&Catalog::edx());
    }

    #[test]
    fn xapi_catalog_selectors_form_a_forest() {
        assert_forest(&Catalog::xapi());
    }
}
