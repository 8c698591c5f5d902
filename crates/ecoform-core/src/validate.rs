use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;
use uuid::Uuid;

use crate::context::AmbientSource;
use crate::error::{IssueSeverity, ValidationIssue, ValidationReport};
use crate::phone;
use crate::rule::{DefaultPolicy, FieldKind, FieldRule};
use crate::schema::ObjectSchema;

/// A validated, defaulted record together with any advisory warnings.
#[derive(Debug, Clone)]
pub struct ValidatedRecord {
    pub record: Map<String, Value>,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a raw record against an object schema.
///
/// Evaluation is structural and field-local: every field's rule is checked
/// independently and all violations are collected, so the caller sees the
/// complete error list in one pass. Unknown input fields are ignored;
/// absent fields are treated as null for default resolution. Computed
/// defaults are read from `ambient`.
pub fn validate_record(
    input: &Value,
    schema: &ObjectSchema,
    ambient: &dyn AmbientSource,
) -> Result<ValidatedRecord, ValidationReport> {
    let mut report = ValidationReport::default();

    let Some(object) = input.as_object() else {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "type_mismatch",
            "$",
            format!("expected an object, found {}", json_type_name(input)),
            None,
        ));
        return Err(report);
    };

    match validate_object(object, schema, "", ambient, &mut report) {
        Some(record) if report.is_ok() => Ok(ValidatedRecord {
            record,
            warnings: report.warnings,
        }),
        _ => Err(report),
    }
}

fn validate_object(
    input: &Map<String, Value>,
    schema: &ObjectSchema,
    prefix: &str,
    ambient: &dyn AmbientSource,
    report: &mut ValidationReport,
) -> Option<Map<String, Value>> {
    let mut out = Map::new();
    let mut ok = true;

    for (name, rule) in schema.fields() {
        let path = join_path(prefix, name);
        let value = input.get(name).unwrap_or(&Value::Null);
        match validate_field(value, rule, &path, ambient, report) {
            Some(validated) => {
                out.insert(name.to_string(), validated);
            }
            None => ok = false,
        }
    }

    ok.then_some(out)
}

fn validate_field(
    value: &Value,
    rule: &FieldRule,
    path: &str,
    ambient: &dyn AmbientSource,
    report: &mut ValidationReport,
) -> Option<Value> {
    if value.is_null() {
        return match &rule.default {
            Some(policy) => Some(resolve_default(policy, ambient)),
            // `any` places no constraint at all, null included.
            None if matches!(rule.kind, FieldKind::Any) => Some(Value::Null),
            None => {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "required_field_missing",
                    path,
                    "required field is missing",
                    None,
                ));
                None
            }
        };
    }

    let validated = match &rule.kind {
        FieldKind::Object { schema } => {
            let Some(object) = value.as_object() else {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "type_mismatch",
                    path,
                    format!("expected an object, found {}", json_type_name(value)),
                    None,
                ));
                return None;
            };
            return validate_object(object, schema, path, ambient, report).map(Value::Object);
        }
        FieldKind::Array { element } => {
            let Some(items) = value.as_array() else {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "type_mismatch",
                    path,
                    format!("expected an array, found {}", json_type_name(value)),
                    None,
                ));
                return None;
            };
            let mut out = Vec::with_capacity(items.len());
            let mut ok = true;
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{path}.{index}");
                match validate_field(item, element, &item_path, ambient, report) {
                    Some(validated) => out.push(validated),
                    None => ok = false,
                }
            }
            return ok.then_some(Value::Array(out));
        }
        kind => match apply_primitive(kind, value) {
            Ok(validated) => validated,
            Err((code, message)) => {
                report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    code,
                    path,
                    message,
                    None,
                ));
                return None;
            }
        },
    };

    if let Some(limit) = rule.recommended_max_len {
        if let Some(text) = validated.as_str() {
            if text.chars().count() > limit {
                report.push_warning(ValidationIssue::new(
                    IssueSeverity::Warning,
                    "recommended_length_exceeded",
                    path,
                    format!("Recommended under {limit} characters"),
                    None,
                ));
            }
        }
    }

    Some(validated)
}

/// Check a value against a primitive kind, returning the accepted value
/// (rewritten for normalizing kinds) or the failing `(code, message)`.
///
/// Also backs the schema invariant sweep, which is why array and object
/// kinds get a shallow structural check here.
fn apply_primitive(kind: &FieldKind, value: &Value) -> Result<Value, (&'static str, String)> {
    match kind {
        FieldKind::Any => Ok(value.clone()),
        FieldKind::Text { max_len } => {
            let text = expect_string(value)?;
            if let Some(limit) = max_len {
                if text.chars().count() > *limit {
                    return Err((
                        "out_of_range",
                        format!("expected at most {limit} characters"),
                    ));
                }
            }
            Ok(value.clone())
        }
        FieldKind::Number { bounds } => {
            let Some(number) = value.as_f64() else {
                return Err((
                    "type_mismatch",
                    format!("expected a number, found {}", json_type_name(value)),
                ));
            };
            if !bounds.contains(number) {
                let mut expected = Vec::new();
                if let Some(min) = bounds.min {
                    expected.push(if bounds.exclusive_min {
                        format!("> {min}")
                    } else {
                        format!(">= {min}")
                    });
                }
                if let Some(max) = bounds.max {
                    expected.push(format!("<= {max}"));
                }
                return Err((
                    "out_of_range",
                    format!("expected a number {}", expected.join(" and ")),
                ));
            }
            Ok(value.clone())
        }
        FieldKind::Integer => coerce_integer(value),
        FieldKind::Boolean => {
            if value.is_boolean() {
                Ok(value.clone())
            } else {
                Err((
                    "type_mismatch",
                    format!("expected a boolean, found {}", json_type_name(value)),
                ))
            }
        }
        FieldKind::Date => {
            let text = expect_string(value)?;
            if date_pattern().is_match(text)
                && NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
            {
                Ok(value.clone())
            } else {
                Err((
                    "invalid_format",
                    "expected an ISO calendar date (YYYY-MM-DD)".to_string(),
                ))
            }
        }
        FieldKind::Identifier => {
            let text = expect_string(value)?;
            if text.len() == 36 && Uuid::parse_str(text).is_ok() {
                Ok(value.clone())
            } else {
                Err((
                    "invalid_format",
                    "expected a UUID in canonical form".to_string(),
                ))
            }
        }
        FieldKind::Email => {
            let text = expect_string(value)?;
            if email_pattern().is_match(text) {
                Ok(value.clone())
            } else {
                Err(("invalid_format", "expected a valid email address".to_string()))
            }
        }
        FieldKind::Url => {
            let text = expect_string(value)?;
            if Url::parse(text).is_ok() {
                Ok(value.clone())
            } else {
                Err(("invalid_format", "expected a valid URL".to_string()))
            }
        }
        FieldKind::Phone => {
            let text = expect_string(value)?;
            match phone::normalize(text) {
                Some(formatted) => Ok(Value::String(formatted)),
                None => Err(("invalid_format", "invalid phone number".to_string())),
            }
        }
        FieldKind::Token { tokens } => {
            let text = expect_string(value)?;
            if tokens.contains(&text) {
                Ok(value.clone())
            } else {
                Err((
                    "unknown_token",
                    format!("'{text}' is not a permitted value"),
                ))
            }
        }
        FieldKind::Array { element } => {
            let Some(items) = value.as_array() else {
                return Err((
                    "type_mismatch",
                    format!("expected an array, found {}", json_type_name(value)),
                ));
            };
            for item in items {
                apply_primitive(&element.kind, item)?;
            }
            Ok(value.clone())
        }
        FieldKind::Object { .. } => {
            if value.is_object() {
                Ok(value.clone())
            } else {
                Err((
                    "type_mismatch",
                    format!("expected an object, found {}", json_type_name(value)),
                ))
            }
        }
    }
}

/// Failure details when `value` does not satisfy the primitive `kind`.
/// Used by the schema invariant sweep on declared defaults.
pub(crate) fn check_primitive(
    kind: &FieldKind,
    value: &Value,
) -> Option<(&'static str, String)> {
    apply_primitive(kind, value).err()
}

fn expect_string(value: &Value) -> Result<&str, (&'static str, String)> {
    value.as_str().ok_or_else(|| {
        (
            "type_mismatch",
            format!("expected a string, found {}", json_type_name(value)),
        )
    })
}

fn coerce_integer(value: &Value) -> Result<Value, (&'static str, String)> {
    if let Some(integer) = value.as_i64() {
        return Ok(Value::from(integer));
    }
    if let Some(number) = value.as_f64() {
        if number.fract() == 0.0 && number >= i64::MIN as f64 && number <= i64::MAX as f64 {
            return Ok(Value::from(number as i64));
        }
        return Err((
            "type_mismatch",
            format!("expected an integer, found fractional number {number}"),
        ));
    }
    if let Some(text) = value.as_str() {
        if let Ok(integer) = text.trim().parse::<i64>() {
            return Ok(Value::from(integer));
        }
    }
    Err((
        "type_mismatch",
        format!(
            "expected an integer or integer string, found {}",
            json_type_name(value)
        ),
    ))
}

fn resolve_default(policy: &DefaultPolicy, ambient: &dyn AmbientSource) -> Value {
    match policy {
        DefaultPolicy::Null => Value::Null,
        DefaultPolicy::Value { value } => value.clone(),
        DefaultPolicy::Today => {
            Value::String(ambient.today().format("%Y-%m-%d").to_string())
        }
        DefaultPolicy::NewId => Value::String(ambient.new_id().hyphenated().to_string()),
        DefaultPolicy::CurrentYear => Value::from(i64::from(ambient.current_year())),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn date_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"))
}

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}
