//! edX tracking-event shapes: the Open Response Assessment family.

use crate::catalog::{Catalog, Shape};
use crate::contract::{Contract, FieldRule, FieldType};
use crate::selector::Selector;

/// Locator of an openassessment block inside a course.
const ITEM_ID_PATTERN: &str = r"^block-v1:.+\+.+\+.+type@openassessment\+block@[a-f0-9]{32}$";

/// Rubric content hashes are short hex digests.
const CONTENT_HASH_PATTERN: &str = "^[a-f0-9]{1,40}$";

fn server_selector(event_type: &str) -> Selector {
    Selector::new([("event_source", "server"), ("event_type", event_type)])
}

/// Envelope fields shared by every server event.
fn server_envelope(event_type: &str) -> Contract {
    Contract::new()
        .rule(FieldRule::required("event_source", FieldType::Str).literal("server"))
        .rule(FieldRule::required("event_type", FieldType::Str).literal(event_type))
        .rule(FieldRule::required("page", FieldType::Str).literal("x_module"))
        .rule(FieldRule::required("event", FieldType::JsonObject))
}

fn submission_retrieval_rules(contract: Contract) -> Contract {
    contract
        .rule(FieldRule::required("event.course_id", FieldType::Str).max_length(255))
        .rule(FieldRule::required("event.item_id", FieldType::Str).matching(ITEM_ID_PATTERN))
        .rule(FieldRule::required("event.requesting_student_id", FieldType::Str))
        .rule(
            FieldRule::required("event.submission_returned_uuid", FieldType::Str).nullable(),
        )
}

fn assess_rules(contract: Contract) -> Contract {
    contract
        .rule(FieldRule::required("event.feedback", FieldType::Str))
        .rule(FieldRule::required("event.parts", FieldType::Array))
        .rule(FieldRule::required("event.rubric", FieldType::Object))
        .rule(
            FieldRule::required("event.rubric.content_hash", FieldType::Str)
                .matching(CONTENT_HASH_PATTERN),
        )
        .rule(FieldRule::required("event.scored_at", FieldType::DateTime))
        .rule(FieldRule::required("event.scorer_id", FieldType::Str).max_length(40))
        .rule(FieldRule::required("event.score_type", FieldType::Str).one_of(["PE", "SE", "ST"]))
        .rule(FieldRule::required("event.submission_uuid", FieldType::Uuid))
        .closed("event.rubric", ["content_hash"])
}

/// Register the edX shape family into `catalog`.
pub fn register(catalog: &mut Catalog) {
    // The open parent shape: any server-sourced event.
    catalog.register(Shape::new(
        "edx.server",
        Selector::new([("event_source", "server")]),
        Contract::new()
            .rule(FieldRule::required("event_source", FieldType::Str).literal("server"))
            .rule(FieldRule::required("event_type", FieldType::Str)),
    ));

    catalog.register(Shape::new(
        "edx.ora.get_peer_submission",
        server_selector("openassessmentblock.get_peer_submission"),
        submission_retrieval_rules(server_envelope("openassessmentblock.get_peer_submission")),
    ));

    catalog.register(Shape::new(
        "edx.ora.get_submission_for_staff_grading",
        server_selector("openassessmentblock.get_submission_for_staff_grading"),
        submission_retrieval_rules(server_envelope(
            "openassessmentblock.get_submission_for_staff_grading",
        ))
        .rule(FieldRule::required("event.requesting_staff_id", FieldType::Str))
        .rule(FieldRule::required("event.type", FieldType::Str)),
    ));

    catalog.register(Shape::new(
        "edx.ora.peer_assess",
        server_selector("openassessmentblock.peer_assess"),
        assess_rules(server_envelope("openassessmentblock.peer_assess")),
    ));

    catalog.register(Shape::new(
        "edx.ora.self_assess",
        server_selector("openassessmentblock.self_assess"),
        assess_rules(server_envelope("openassessmentblock.self_assess")),
    ));

    catalog.register(Shape::new(
        "edx.ora.staff_assess",
        server_selector("openassessmentblock.staff_assess"),
        assess_rules(server_envelope("openassessmentblock.staff_assess"))
            .rule(FieldRule::required("event.type", FieldType::Str).one_of(["regrade", "full-grade"])),
    ));

    catalog.register(Shape::new(
        "edx.ora.submit_feedback_on_assessments",
        server_selector("openassessmentblock.submit_feedback_on_assessments"),
        server_envelope("openassessmentblock.submit_feedback_on_assessments")
            .rule(FieldRule::required("event.feedback_text", FieldType::Str))
            .rule(FieldRule::required("event.options", FieldType::Array))
            .rule(FieldRule::required("event.submission_uuid", FieldType::Uuid)),
    ));

    catalog.register(Shape::new(
        "edx.ora.create_submission",
        server_selector("openassessmentblock.create_submission"),
        server_envelope("openassessmentblock.create_submission")
            .rule(FieldRule::required("event.answer", FieldType::Object))
            .rule(FieldRule::required("event.answer.text", FieldType::Str))
            .rule(FieldRule::optional("event.answer.file_upload_key", FieldType::Str))
            .rule(FieldRule::required("event.attempt_number", FieldType::Int))
            .rule(FieldRule::required("event.created_at", FieldType::DateTime))
            .rule(FieldRule::required("event.submitted_at", FieldType::DateTime))
            .rule(FieldRule::required("event.submission_uuid", FieldType::Uuid)),
    ));

    catalog.register(Shape::new(
        "edx.ora.save_submission",
        server_selector("openassessmentblock.save_submission"),
        server_envelope("openassessmentblock.save_submission")
            // The saved response arrives either as an object or as a
            // JSON-encoded string of one.
            .rule(FieldRule::required("event.saved_response", FieldType::JsonObject)),
    ));

    catalog.register(Shape::new(
        "edx.ora.student_training_assess_example",
        server_selector("openassessment.student_training_assess_example"),
        server_envelope("openassessment.student_training_assess_example")
            .rule(FieldRule::required("event.corrections", FieldType::Object))
            .rule(FieldRule::required("event.options_selected", FieldType::Object))
            .rule(FieldRule::required("event.submission_uuid", FieldType::Uuid)),
    ));

    catalog.register(Shape::new(
        "edx.ora.upload_file",
        server_selector("openassessment.upload_file"),
        server_envelope("openassessment.upload_file")
            .rule(FieldRule::required("event.fileName", FieldType::Str).max_length(255))
            .rule(FieldRule::required("event.fileSize", FieldType::Int))
            .rule(FieldRule::required("event.fileType", FieldType::Str)),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn peer_assess_dispatches_to_the_specific_shape() {
        let catalog = Catalog::edx();
        let record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.peer_assess",
            "page": "x_module",
            "event": {}
        });
        assert_eq!(catalog.dispatch(&record).unwrap().name(), "edx.ora.peer_assess");
    }

    #[test]
    fn unknown_server_event_falls_back_to_the_parent() {
        let catalog = Catalog::edx();
        let record = json!({
            "event_source": "server",
            "event_type": "problem_check"
        });
        assert_eq!(catalog.dispatch(&record).unwrap().name(), "edx.server");
    }

    #[test]
    fn item_id_regex_requires_the_block_locator_form() {
        let catalog = Catalog::edx();
        let shape = catalog
            .shapes()
            .iter()
            .find(|s| s.name() == "edx.ora.get_peer_submission")
            .unwrap();

        let mut record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.get_peer_submission",
            "page": "x_module",
            "event": {
                "course_id": "course-v1:edX+DemoX+Demo_Course",
                "item_id": "block-v1:edX+DemoX+Demo_Course+type@openassessment+block@1fb9e3bd26d74d5fa8a9f7d4f5fcb55a",
                "requesting_student_id": "a3f2",
                "submission_returned_uuid": null
            }
        });
        assert!(shape.contract().check(&record).is_ok());

        record["event"]["item_id"] = json!("block-v1:bad-locator");
        let err = shape.contract().check(&record).unwrap_err();
        assert_eq!(err.path, "event.item_id");
    }

    #[test]
    fn staff_assess_type_must_be_a_known_grading_mode() {
        let catalog = Catalog::edx();
        let shape = catalog
            .shapes()
            .iter()
            .find(|s| s.name() == "edx.ora.staff_assess")
            .unwrap();
        let mut record = json!({
            "event_source": "server",
            "event_type": "openassessmentblock.staff_assess",
            "page": "x_module",
            "event": {
                "feedback": "",
                "parts": [],
                "rubric": {"content_hash": "de36ba38a3ff79f4f17a557ab6e6b8bc0cd5a6ba"},
                "scored_at": "2023-02-17T16:55:17.721627+00:00",
                "scorer_id": "c9db2cf559ca4fa0a7c3b2b4e80b8d32",
                "score_type": "ST",
                "submission_uuid": "9f03e1af-f364-4053-ad0e-b09c2f9c0bd9",
                "type": "regrade"
            }
        });
        assert!(shape.contract().check(&record).is_ok());

        record["event"]["type"] = json!("partial-grade");
        assert!(shape.contract().check(&record).is_err());
    }
}
