//! xAPI statement shapes.
//!
//! Each shape is keyed on the `(verb.id, object.definition.type)` concept
//! pair and declares the registered English-US display as the default for
//! the verb's display map.

use serde_json::json;

use crate::catalog::{Catalog, Shape};
use crate::contract::{Contract, FieldRule, FieldType};
use crate::selector::Selector;

const VERB_ANSWERED: &str = "http://adlnet.gov/expapi/verbs/answered";
const VERB_INITIALIZED: &str = "http://adlnet.gov/expapi/verbs/initialized";
const VERB_LAUNCHED: &str = "http://adlnet.gov/expapi/verbs/launched";
const VERB_COMPLETED: &str = "http://adlnet.gov/expapi/verbs/completed";
const VERB_TERMINATED: &str = "http://adlnet.gov/expapi/verbs/terminated";
const VERB_VIEWED: &str = "http://id.tincanapi.com/verb/viewed";
const VERB_PLAYED: &str = "https://w3id.org/xapi/video/verbs/played";
const VERB_PAUSED: &str = "https://w3id.org/xapi/video/verbs/paused";
const VERB_SEEKED: &str = "https://w3id.org/xapi/video/verbs/seeked";

const TYPE_CMI_INTERACTION: &str = "http://adlnet.gov/expapi/activities/cmi.interaction";
const TYPE_PAGE: &str = "http://activitystrea.ms/schema/1.0/page";
const TYPE_VIDEO: &str = "https://w3id.org/xapi/video/activity-type/video";

fn concept_selector(verb_id: &str, activity_type: &str) -> Selector {
    Selector::new([
        ("verb.id", verb_id),
        ("object.definition.type", activity_type),
    ])
}

fn statement_contract(verb_id: &str, activity_type: &str, display: &str) -> Contract {
    Contract::new()
        .rule(FieldRule::required("actor", FieldType::Object))
        .rule(FieldRule::required("verb", FieldType::Object))
        .rule(FieldRule::required("verb.id", FieldType::Str).literal(verb_id))
        .rule(FieldRule::required("object", FieldType::Object))
        .rule(FieldRule::required("object.id", FieldType::Str))
        .rule(
            FieldRule::required("object.definition.type", FieldType::Str).literal(activity_type),
        )
        .rule(FieldRule::optional("id", FieldType::Uuid))
        .rule(FieldRule::optional("timestamp", FieldType::DateTime))
        .default_value("verb.display", json!({ "en-US": display }))
}

fn register_concept(
    catalog: &mut Catalog,
    name: &'static str,
    verb_id: &str,
    activity_type: &str,
    display: &str,
) {
    catalog.register(Shape::new(
        name,
        concept_selector(verb_id, activity_type),
        statement_contract(verb_id, activity_type, display),
    ));
}

/// Register the xAPI shape family into `catalog`.
pub fn register(catalog: &mut Catalog) {
    register_concept(
        catalog,
        "xapi.assessment.answered",
        VERB_ANSWERED,
        TYPE_CMI_INTERACTION,
        "answered",
    );
    register_concept(
        catalog,
        "xapi.assessment.initialized",
        VERB_INITIALIZED,
        TYPE_CMI_INTERACTION,
        "initialized",
    );
    register_concept(
        catalog,
        "xapi.assessment.launched",
        VERB_LAUNCHED,
        TYPE_CMI_INTERACTION,
        "launched",
    );
    register_concept(
        catalog,
        "xapi.assessment.completed",
        VERB_COMPLETED,
        TYPE_CMI_INTERACTION,
        "completed",
    );
    register_concept(
        catalog,
        "xapi.assessment.terminated",
        VERB_TERMINATED,
        TYPE_CMI_INTERACTION,
        "terminated",
    );
    register_concept(
        catalog,
        "xapi.navigation.page_viewed",
        VERB_VIEWED,
        TYPE_PAGE,
        "viewed",
    );
    register_concept(
        catalog,
        "xapi.navigation.page_terminated",
        VERB_TERMINATED,
        TYPE_PAGE,
        "terminated",
    );
    register_concept(catalog, "xapi.video.played", VERB_PLAYED, TYPE_VIDEO, "played");
    register_concept(catalog, "xapi.video.paused", VERB_PAUSED, TYPE_VIDEO, "paused");
    register_concept(catalog, "xapi.video.seeked", VERB_SEEKED, TYPE_VIDEO, "seeked");
}
