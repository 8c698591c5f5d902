use std::sync::Arc;

use chrono::NaiveDate;
use ecoform_core::rule::{
    self, boolean, iso_date, latitude, non_negative_number, positive_number, text, token,
    token_array,
};
use ecoform_core::{FixedAmbient, ObjectSchema, derive_json_schema, validate_record};
use jsonschema::JSONSchema;
use serde_json::{Value, json};
use uuid::Uuid;

const CLIMATE_ZONES: &[&str] = &["1A", "2A", "2B", "3A"];

#[test]
fn nested_nullable_section_round_trips() {
    let impacts = Arc::new(ObjectSchema::new([
        ("GWP_total", non_negative_number()),
        ("AP_total", non_negative_number()),
        ("EP_total", non_negative_number()),
    ]));
    let schema = ObjectSchema::new([(
        "A1A3",
        rule::object(impacts).or_null().described("Product stage totals"),
    )]);

    let doc = derive_json_schema(&schema, "stage-sample").expect("derivable");

    let node = &doc["properties"]["A1A3"];
    let variants = node["anyOf"].as_array().expect("nullable section wraps in anyOf");
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[1], json!({ "type": "null" }));

    let section = &variants[0];
    assert_eq!(section["type"], json!("object"));
    let properties = section["properties"].as_object().expect("properties");
    assert_eq!(properties.len(), 3);
    for field in ["GWP_total", "AP_total", "EP_total"] {
        assert_eq!(properties[field]["type"], json!("number"));
        assert_eq!(properties[field]["minimum"], json!(0.0));
    }

    assert_eq!(node["default"], Value::Null);
    assert_eq!(node["description"], json!("Product stage totals"));
}

#[test]
fn constraints_round_trip_losslessly() {
    let schema = ObjectSchema::new([
        ("project_name", text().max_len(200)),
        ("building_height", positive_number()),
        ("lat", latitude()),
        ("climate_zone", token(CLIMATE_ZONES).or_null()),
        ("certifications", token_array(CLIMATE_ZONES)),
        ("assessment_date", iso_date().or_null()),
    ]);

    let doc = derive_json_schema(&schema, "round-trip").expect("derivable");
    let properties = doc["properties"].as_object().expect("properties");

    assert_eq!(properties["project_name"]["maxLength"], json!(200));
    assert_eq!(properties["building_height"]["exclusiveMinimum"], json!(0.0));
    assert_eq!(properties["lat"]["minimum"], json!(-90.0));
    assert_eq!(properties["lat"]["maximum"], json!(90.0));

    // Nullable enum keeps the token list and adds the null literal.
    assert_eq!(
        properties["climate_zone"]["type"],
        json!(["string", "null"])
    );
    assert_eq!(
        properties["climate_zone"]["enum"],
        json!(["1A", "2A", "2B", "3A", null])
    );

    assert_eq!(properties["certifications"]["type"], json!("array"));
    assert_eq!(
        properties["certifications"]["items"]["enum"],
        json!(["1A", "2A", "2B", "3A"])
    );
    assert_eq!(properties["certifications"]["default"], json!([]));

    assert_eq!(
        properties["assessment_date"]["type"],
        json!(["string", "null"])
    );
    assert_eq!(properties["assessment_date"]["format"], json!("date"));
}

#[test]
fn required_lists_exactly_the_fields_without_defaults() {
    let schema = ObjectSchema::new([
        ("id", rule::identifier().default_new_id()),
        ("project_name", text()),
        ("date_of_creation", iso_date().default_today()),
        ("anonymized", boolean().with_default(false)),
        ("gross_floor_area", non_negative_number()),
    ]);

    let doc = derive_json_schema(&schema, "required-sample").expect("derivable");

    assert_eq!(
        doc["required"],
        json!(["project_name", "gross_floor_area"])
    );
}

#[test]
fn computed_defaults_are_marked_without_baked_values() {
    let schema = ObjectSchema::new([
        ("id", rule::identifier().default_new_id()),
        ("date_of_creation", iso_date().default_today()),
        ("assessment_year", rule::year().default_current_year()),
        ("anonymized", boolean().with_default(false)),
    ]);

    let doc = derive_json_schema(&schema, "defaults-sample").expect("derivable");
    let properties = doc["properties"].as_object().expect("properties");

    assert_eq!(properties["id"]["x-computed-default"], json!("identifier"));
    assert!(properties["id"].get("default").is_none());
    assert_eq!(
        properties["date_of_creation"]["x-computed-default"],
        json!("today")
    );
    assert_eq!(
        properties["assessment_year"]["x-computed-default"],
        json!("current-year")
    );
    assert_eq!(properties["anonymized"]["default"], json!(false));
    assert!(properties["anonymized"].get("x-computed-default").is_none());
}

#[test]
fn declaration_order_is_preserved() {
    let schema = ObjectSchema::new([
        ("zulu", text()),
        ("alpha", text()),
        ("mike", text()),
    ]);

    let doc = derive_json_schema(&schema, "order-sample").expect("derivable");
    let names: Vec<&String> = doc["properties"]
        .as_object()
        .expect("properties")
        .keys()
        .collect();

    assert_eq!(names, ["zulu", "alpha", "mike"]);
}

#[test]
fn derived_document_validates_validated_records() {
    let impacts = Arc::new(ObjectSchema::new([
        ("GWP_total", non_negative_number()),
        ("CED_total", non_negative_number().or_null()),
    ]));
    let schema = ObjectSchema::new([
        ("id", rule::identifier().default_new_id()),
        ("project_name", text().max_len(200)),
        ("date_of_creation", iso_date().default_today()),
        ("climate_zone", token(CLIMATE_ZONES).or_null()),
        ("lat", latitude()),
        ("B6", rule::object(impacts).or_null()),
    ]);
    let ambient = FixedAmbient {
        today: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        id: Uuid::parse_str("7a4f1f3e-9a35-4f4e-8d10-2f2f6d2a9b01").expect("valid uuid"),
    };

    let doc = derive_json_schema(&schema, "compiled-sample").expect("derivable");
    let compiled = JSONSchema::compile(&doc).expect("derived document compiles");

    let validated = validate_record(
        &json!({
            "project_name": "Harbor Commons",
            "lat": 44.97,
            "B6": { "GWP_total": 120.5 },
        }),
        &schema,
        &ambient,
    )
    .expect("record validates");
    assert!(compiled.is_valid(&Value::Object(validated.record)));

    // The compiled document and the validator agree on rejection too.
    let invalid = json!({
        "project_name": "Harbor Commons",
        "lat": 944.97,
        "climate_zone": "9Z",
    });
    assert!(!compiled.is_valid(&invalid));
    assert!(validate_record(&invalid, &schema, &ambient).is_err());
}

#[test]
fn shared_subschema_reuse_is_not_reported_as_a_cycle() {
    let impacts = Arc::new(ObjectSchema::new([("GWP_total", non_negative_number())]));
    let schema = ObjectSchema::new([
        ("A1A3", rule::object(Arc::clone(&impacts)).or_null()),
        ("A4", rule::object(Arc::clone(&impacts)).or_null()),
        ("A5_total", rule::object(impacts).or_null()),
    ]);

    let doc = derive_json_schema(&schema, "reuse-sample").expect("sibling reuse is acyclic");
    assert_eq!(doc["properties"].as_object().expect("properties").len(), 3);
}
