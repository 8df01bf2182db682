//! Dispatch-then-check validation of raw records.

use lrs_error::ValidationFailure;
use serde_json::Value;
use tracing::debug;

use crate::catalog::Catalog;

/// A record that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedStatement {
    /// Name of the shape the record matched.
    pub shape: &'static str,
    /// The record with the shape's defaults applied.
    pub record: Value,
}

/// Turns raw records into validated statements.
///
/// Validation never retries: the caller decides whether a failure is
/// propagated or logged and skipped.
#[derive(Debug, Clone)]
pub struct Validator {
    catalog: Catalog,
}

impl Validator {
    /// A validator over `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    /// A validator over the edX tracking-event shapes.
    pub fn edx() -> Self {
        Self::new(Catalog::edx())
    }

    /// A validator over the xAPI statement shapes.
    pub fn xapi() -> Self {
        Self::new(Catalog::xapi())
    }

    /// The underlying catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Validate one record: dispatch to the most specific shape, apply
    /// its defaults, and check its field contract.
    pub fn validate(&self, record: &Value) -> Result<ValidatedStatement, ValidationFailure> {
        let shape = self.catalog.dispatch(record)?;
        let filled = shape.contract().apply_defaults(record);
        shape.contract().check(&filled)?;
        debug!(shape = shape.name(), "record validated");
        Ok(ValidatedStatement {
            shape: shape.name(),
            record: filled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrs_error::ValidationKind;
    use serde_json::json;

    #[test]
    fn valid_ora_event_passes_with_its_shape_name() {
        let validator = Validator::edx();
        let record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.save_submission",
            "page": "x_module",
            "event": {"saved_response": {"parts": [{"text": "draft"}]}}
        });
        let validated = validator.validate(&record).unwrap();
        assert_eq!(validated.shape, "edx.ora.save_submission");
    }

    #[test]
    fn contract_violations_surface_after_dispatch() {
        let validator = Validator::edx();
        let record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.save_submission",
            "page": "another_page",
            "event": {"saved_response": {}}
        });
        let err = validator.validate(&record).unwrap_err();
        assert_eq!(err.path, "page");
        assert_eq!(err.kind, ValidationKind::UnexpectedLiteral);
    }

    #[test]
    fn unmatched_records_fail_with_no_matching_shape() {
        let validator = Validator::edx();
        let err = validator.validate(&json!({"foo": "bar"})).unwrap_err();
        assert_eq!(err.kind, ValidationKind::NoMatchingShape);
    }

    #[test]
    fn defaults_are_applied_before_the_check() {
        let validator = Validator::xapi();
        let record = json!({
            "actor": {"mbox": "mailto:learner@example.com"},
            "verb": {"id": "https://w3id.org/xapi/video/verbs/played"},
            "object": {
                "id": "uuid://b0e3b4a7",
                "definition": {"type": "https://w3id.org/xapi/video/activity-type/video"}
            }
        });
        let validated = validator.validate(&record).unwrap();
        assert_eq!(
            validated.record["verb"]["display"],
            json!({"en-US": "played"})
        );
    }
}
