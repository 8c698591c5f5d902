use chrono::NaiveDate;
use ecoform_core::rule::{
    self, any, boolean, email, identifier, iso_date, non_negative_number, phone,
    positive_number, text, token, token_array, year,
};
use ecoform_core::{FixedAmbient, IssueSeverity, ObjectSchema, validate_record};
use serde_json::{Value, json};
use uuid::Uuid;

const ASSET_TYPES: &[&str] = &["Building", "Infrastructure", "Renovation"];

fn ambient() -> FixedAmbient {
    FixedAmbient {
        today: NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
        id: Uuid::parse_str("7a4f1f3e-9a35-4f4e-8d10-2f2f6d2a9b01").expect("valid uuid"),
    }
}

#[test]
fn negative_area_fails_with_range_violation() {
    let schema = ObjectSchema::new([("gross_floor_area", positive_number())]);

    let report = validate_record(&json!({ "gross_floor_area": -5 }), &schema, &ambient())
        .expect_err("negative area must fail");

    assert_eq!(report.errors.len(), 1);
    let issue = &report.errors[0];
    assert_eq!(issue.code, "out_of_range");
    assert_eq!(issue.path, "gross_floor_area");
    assert_eq!(issue.severity, IssueSeverity::Error);
}

#[test]
fn date_of_creation_defaults_to_today() {
    let schema = ObjectSchema::new([("date_of_creation", iso_date().default_today())]);

    let validated = validate_record(&json!({}), &schema, &ambient()).expect("defaults apply");

    assert_eq!(
        validated.record.get("date_of_creation"),
        Some(&json!("2025-03-14"))
    );
}

#[test]
fn phone_is_rewritten_to_international_format() {
    let schema = ObjectSchema::new([("owner_phone", phone())]);

    let validated = validate_record(
        &json!({ "owner_phone": "212-555-0100" }),
        &schema,
        &ambient(),
    )
    .expect("valid phone");

    assert_eq!(
        validated.record.get("owner_phone"),
        Some(&json!("+1 212-555-0100"))
    );
}

#[test]
fn long_project_name_warns_but_validates() {
    let schema = ObjectSchema::new([(
        "project_name",
        text().max_len(200).recommended_len(40),
    )]);

    let validated = validate_record(
        &json!({ "project_name": "A very long project name exceeding forty characters total" }),
        &schema,
        &ambient(),
    )
    .expect("warning must not reject");

    assert_eq!(validated.warnings.len(), 1);
    let warning = &validated.warnings[0];
    assert_eq!(warning.severity, IssueSeverity::Warning);
    assert_eq!(warning.code, "recommended_length_exceeded");
    assert_eq!(warning.message, "Recommended under 40 characters");
    assert_eq!(warning.path, "project_name");
}

#[test]
fn unknown_enum_token_is_rejected_with_path() {
    let schema = ObjectSchema::new([("asset_type", token(ASSET_TYPES))]);

    let report = validate_record(
        &json!({ "asset_type": "not-a-real-type" }),
        &schema,
        &ambient(),
    )
    .expect_err("unknown token must fail");

    assert_eq!(report.errors.len(), 1);
    let issue = &report.errors[0];
    assert_eq!(issue.code, "unknown_token");
    assert_eq!(issue.path, "asset_type");
    assert!(issue.message.contains("not-a-real-type"));
}

#[test]
fn all_violations_are_collected_without_short_circuit() {
    let schema = ObjectSchema::new([
        ("name", text()),
        ("area", non_negative_number()),
        ("asset_type", token(ASSET_TYPES)),
        ("contact", email()),
    ]);

    let report = validate_record(
        &json!({
            "name": 7,
            "area": -1,
            "asset_type": "castle",
            "contact": "not-an-email",
        }),
        &schema,
        &ambient(),
    )
    .expect_err("four independent violations");

    assert_eq!(report.errors.len(), 4);
    let paths: Vec<&str> = report.errors.iter().map(|issue| issue.path.as_str()).collect();
    assert_eq!(paths, ["name", "area", "asset_type", "contact"]);
}

#[test]
fn valid_inputs_pass_through_unchanged() {
    let schema = ObjectSchema::new([
        ("name", text()),
        ("area", positive_number()),
        ("lat", rule::latitude()),
        ("lng", rule::longitude()),
        ("historic", boolean()),
        ("assessed_on", iso_date()),
        ("record_id", identifier()),
        ("contact", email()),
        ("site", rule::url()),
    ]);
    let input = json!({
        "name": "Harbor Commons",
        "area": 1250.5,
        "lat": 44.97,
        "lng": -93.26,
        "historic": false,
        "assessed_on": "2024-11-02",
        "record_id": "7a4f1f3e-9a35-4f4e-8d10-2f2f6d2a9b01",
        "contact": "assessor@example.org",
        "site": "https://example.org/projects/harbor-commons",
    });

    let validated = validate_record(&input, &schema, &ambient()).expect("all valid");

    assert_eq!(Value::Object(validated.record), input);
    assert!(validated.warnings.is_empty());
}

#[test]
fn absent_and_explicit_null_both_resolve_defaults() {
    let schema = ObjectSchema::new([
        ("notes", text().or_null()),
        ("anonymized", boolean().with_default(false)),
    ]);

    let absent = validate_record(&json!({}), &schema, &ambient()).expect("defaults");
    assert_eq!(absent.record.get("notes"), Some(&Value::Null));
    assert_eq!(absent.record.get("anonymized"), Some(&json!(false)));

    let explicit = validate_record(
        &json!({ "notes": null, "anonymized": null }),
        &schema,
        &ambient(),
    )
    .expect("defaults");
    assert_eq!(explicit.record.get("notes"), Some(&Value::Null));
    assert_eq!(explicit.record.get("anonymized"), Some(&json!(false)));
}

#[test]
fn generated_identifier_and_current_year_defaults() {
    let schema = ObjectSchema::new([
        ("id", identifier().default_new_id()),
        ("assessment_year", year().default_current_year()),
    ]);

    let validated = validate_record(&json!({}), &schema, &ambient()).expect("defaults");

    assert_eq!(
        validated.record.get("id"),
        Some(&json!("7a4f1f3e-9a35-4f4e-8d10-2f2f6d2a9b01"))
    );
    assert_eq!(validated.record.get("assessment_year"), Some(&json!(2025)));
}

#[test]
fn revalidating_a_validated_record_is_idempotent() {
    let schema = ObjectSchema::new([
        ("id", identifier().default_new_id()),
        ("date_of_creation", iso_date().default_today()),
        ("owner_phone", phone().or_null()),
        ("notes", text().or_null()),
        ("certifications", token_array(ASSET_TYPES)),
    ]);
    let input = json!({ "owner_phone": "(212) 555-0100" });

    let once = validate_record(&input, &schema, &ambient()).expect("first pass");
    let twice = validate_record(&Value::Object(once.record.clone()), &schema, &ambient())
        .expect("second pass");

    assert_eq!(once.record, twice.record);
}

#[test]
fn unknown_input_fields_are_ignored() {
    let schema = ObjectSchema::new([("name", text())]);

    let validated = validate_record(
        &json!({ "name": "Depot", "unexpected": 42 }),
        &schema,
        &ambient(),
    )
    .expect("open-world input");

    assert_eq!(validated.record.len(), 1);
    assert!(!validated.record.contains_key("unexpected"));
}

#[test]
fn missing_required_field_is_reported() {
    let schema = ObjectSchema::new([("project_name", text())]);

    let report =
        validate_record(&json!({}), &schema, &ambient()).expect_err("required field missing");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, "required_field_missing");
    assert_eq!(report.errors[0].path, "project_name");
}

#[test]
fn nested_section_errors_use_dotted_paths() {
    let impacts = std::sync::Arc::new(ObjectSchema::new([("GWP_total", non_negative_number())]));
    let schema = ObjectSchema::new([("elements", rule::object(std::sync::Arc::new(
        ObjectSchema::new([("substructure", rule::object(impacts))]),
    )))]);

    let report = validate_record(
        &json!({ "elements": { "substructure": { "GWP_total": -3 } } }),
        &schema,
        &ambient(),
    )
    .expect_err("nested violation");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "elements.substructure.GWP_total");
}

#[test]
fn array_elements_are_validated_with_indexed_paths() {
    let schema = ObjectSchema::new([("certifications", token_array(ASSET_TYPES))]);

    let report = validate_record(
        &json!({ "certifications": ["Building", "fortress"] }),
        &schema,
        &ambient(),
    )
    .expect_err("bad element");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "certifications.1");
    assert_eq!(report.errors[0].code, "unknown_token");
}

#[test]
fn non_object_input_fails_at_root() {
    let schema = ObjectSchema::new([("name", text())]);

    let report = validate_record(&json!([1, 2, 3]), &schema, &ambient())
        .expect_err("input must be an object");

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].path, "$");
    assert_eq!(report.errors[0].code, "type_mismatch");
}

#[test]
fn year_coerces_integer_strings() {
    let schema = ObjectSchema::new([("assessment_year", year())]);

    let validated = validate_record(
        &json!({ "assessment_year": "2024" }),
        &schema,
        &ambient(),
    )
    .expect("coercible");
    assert_eq!(validated.record.get("assessment_year"), Some(&json!(2024)));

    let report = validate_record(
        &json!({ "assessment_year": "20x4" }),
        &schema,
        &ambient(),
    )
    .expect_err("not coercible");
    assert_eq!(report.errors[0].code, "type_mismatch");
}

#[test]
fn malformed_dates_are_rejected() {
    let schema = ObjectSchema::new([("assessment_date", iso_date())]);

    for bad in ["2024-13-01", "2024-02-30", "02/14/2024", "2024-2-3"] {
        let report = validate_record(
            &json!({ "assessment_date": bad }),
            &schema,
            &ambient(),
        )
        .expect_err("malformed date must be rejected");
        assert_eq!(report.errors[0].code, "invalid_format", "date: {bad}");
    }
}

#[test]
fn nullable_nested_section_may_be_absent() {
    let impacts = std::sync::Arc::new(ObjectSchema::new([("GWP_total", non_negative_number())]));
    let schema = ObjectSchema::new([("B6", rule::object(impacts).or_null())]);

    let validated = validate_record(&json!({}), &schema, &ambient()).expect("section optional");
    assert_eq!(validated.record.get("B6"), Some(&Value::Null));
}

#[test]
fn any_field_accepts_arbitrary_values() {
    let schema = ObjectSchema::new([("tool_report_upload", any())]);

    for value in [json!(null), json!("report.pdf"), json!({ "pages": 10 }), json!(3)] {
        let validated = validate_record(
            &json!({ "tool_report_upload": value }),
            &schema,
            &ambient(),
        )
        .expect("any accepts everything");
        assert_eq!(validated.record.get("tool_report_upload"), Some(&value));
    }
}
