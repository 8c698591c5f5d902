use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::schema::ObjectSchema;

/// Numeric bounds for number fields.
///
/// `exclusive_min` turns the lower bound strict (value > min instead of
/// value >= min). Upper bounds are always inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NumberBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclusive_min: bool,
}

impl NumberBounds {
    /// Returns true when `value` satisfies the bounds.
    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            let ok = if self.exclusive_min {
                value > min
            } else {
                value >= min
            };
            if !ok {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

/// Semantic kind of a field, together with its constraint set.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Accepts any JSON value, including null.
    Any,
    /// Textual value with an optional hard length cap.
    Text {
        #[serde(skip_serializing_if = "Option::is_none")]
        max_len: Option<usize>,
    },
    /// Numeric value constrained by bounds.
    Number { bounds: NumberBounds },
    /// Integer, coercing from integer-valued strings (used for years).
    Integer,
    Boolean,
    /// ISO calendar date, `YYYY-MM-DD`.
    Date,
    /// UUID in canonical hyphenated form.
    Identifier,
    Email,
    Url,
    /// Phone number, validated under the default region (US) and rewritten
    /// to international format on acceptance.
    Phone,
    /// Membership in a fixed, ordered set of permitted string tokens.
    Token { tokens: &'static [&'static str] },
    /// Homogeneous array; each element validates against the element rule.
    Array { element: Box<FieldRule> },
    /// Nested object section.
    Object { schema: Arc<ObjectSchema> },
}

impl FieldKind {
    /// Kind name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Any => "any",
            FieldKind::Text { .. } => "string",
            FieldKind::Number { .. } => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Identifier => "identifier",
            FieldKind::Email => "email",
            FieldKind::Url => "url",
            FieldKind::Phone => "phone",
            FieldKind::Token { .. } => "token",
            FieldKind::Array { .. } => "array",
            FieldKind::Object { .. } => "object",
        }
    }
}

/// Default resolution policy for a field whose value is absent or null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DefaultPolicy {
    /// The field is nullable; null is kept as the value.
    Null,
    /// A fixed default value.
    Value { value: Value },
    /// Today's calendar date, read from the ambient source at validation time.
    Today,
    /// A freshly generated identifier.
    NewId,
    /// The current calendar year.
    CurrentYear,
}

/// A named, composable validation unit: kind, constraints, default policy,
/// and documentation. Plain data; both the validator and the derivation
/// walker consume it uniformly.
#[derive(Debug, Clone, Serialize)]
pub struct FieldRule {
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Soft length cap for strings; exceeding it warns instead of failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_max_len: Option<usize>,
}

impl FieldRule {
    fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            description: None,
            recommended_max_len: None,
        }
    }

    /// Accept null (and absence) and keep null as the value.
    pub fn or_null(mut self) -> Self {
        self.default = Some(DefaultPolicy::Null);
        self
    }

    /// Substitute a fixed value when the field is absent or null.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultPolicy::Value {
            value: value.into(),
        });
        self
    }

    /// Substitute today's date when the field is absent or null.
    pub fn default_today(mut self) -> Self {
        self.default = Some(DefaultPolicy::Today);
        self
    }

    /// Substitute a freshly generated identifier when absent or null.
    pub fn default_new_id(mut self) -> Self {
        self.default = Some(DefaultPolicy::NewId);
        self
    }

    /// Substitute the current year when absent or null.
    pub fn default_current_year(mut self) -> Self {
        self.default = Some(DefaultPolicy::CurrentYear);
        self
    }

    /// Attach a human-readable description. Documentation only.
    pub fn described(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Hard length cap for text fields. No effect on other kinds.
    pub fn max_len(mut self, limit: usize) -> Self {
        if let FieldKind::Text { max_len } = &mut self.kind {
            *max_len = Some(limit);
        }
        self
    }

    /// Soft length cap: exceeding it attaches an advisory warning.
    pub fn recommended_len(mut self, limit: usize) -> Self {
        self.recommended_max_len = Some(limit);
        self
    }

    /// True when the validated record may hold null for this field.
    pub fn is_nullable(&self) -> bool {
        matches!(self.default, Some(DefaultPolicy::Null))
    }

    /// True when absence or null resolves to some value instead of failing.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Field accepting any JSON value.
pub fn any() -> FieldRule {
    FieldRule::of(FieldKind::Any)
}

/// Unconstrained textual field.
pub fn text() -> FieldRule {
    FieldRule::of(FieldKind::Text { max_len: None })
}

/// Unconstrained numeric field.
pub fn number() -> FieldRule {
    FieldRule::of(FieldKind::Number {
        bounds: NumberBounds::default(),
    })
}

/// Numeric field with explicit bounds.
pub fn bounded_number(bounds: NumberBounds) -> FieldRule {
    FieldRule::of(FieldKind::Number { bounds })
}

/// Number strictly greater than zero.
pub fn positive_number() -> FieldRule {
    bounded_number(NumberBounds {
        min: Some(0.0),
        max: None,
        exclusive_min: true,
    })
}

/// Number greater than or equal to zero.
pub fn non_negative_number() -> FieldRule {
    bounded_number(NumberBounds {
        min: Some(0.0),
        max: None,
        exclusive_min: false,
    })
}

/// Signed decimal latitude, -90 to 90.
pub fn latitude() -> FieldRule {
    bounded_number(NumberBounds {
        min: Some(-90.0),
        max: Some(90.0),
        exclusive_min: false,
    })
}

/// Signed decimal longitude, -180 to 180.
pub fn longitude() -> FieldRule {
    bounded_number(NumberBounds {
        min: Some(-180.0),
        max: Some(180.0),
        exclusive_min: false,
    })
}

/// Integer field coercing from integer-valued strings.
pub fn year() -> FieldRule {
    FieldRule::of(FieldKind::Integer)
}

pub fn boolean() -> FieldRule {
    FieldRule::of(FieldKind::Boolean)
}

/// ISO calendar date, `YYYY-MM-DD`.
pub fn iso_date() -> FieldRule {
    FieldRule::of(FieldKind::Date)
}

/// UUID in canonical hyphenated form.
pub fn identifier() -> FieldRule {
    FieldRule::of(FieldKind::Identifier)
}

pub fn email() -> FieldRule {
    FieldRule::of(FieldKind::Email)
}

pub fn url() -> FieldRule {
    FieldRule::of(FieldKind::Url)
}

/// Phone number under the default region (US); normalizing.
pub fn phone() -> FieldRule {
    FieldRule::of(FieldKind::Phone)
}

/// Membership in a fixed set of permitted tokens.
pub fn token(tokens: &'static [&'static str]) -> FieldRule {
    FieldRule::of(FieldKind::Token { tokens })
}

/// Array of permitted tokens, defaulting to the empty array.
pub fn token_array(tokens: &'static [&'static str]) -> FieldRule {
    array(token(tokens)).with_default(Value::Array(Vec::new()))
}

/// Homogeneous array of the given element rule.
pub fn array(element: FieldRule) -> FieldRule {
    FieldRule::of(FieldKind::Array {
        element: Box::new(element),
    })
}

/// Nested object section.
pub fn object(schema: Arc<ObjectSchema>) -> FieldRule {
    FieldRule::of(FieldKind::Object { schema })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_respect_exclusive_minimum() {
        let positive = NumberBounds {
            min: Some(0.0),
            max: None,
            exclusive_min: true,
        };
        assert!(positive.contains(0.1));
        assert!(!positive.contains(0.0));
        assert!(!positive.contains(-5.0));

        let non_negative = NumberBounds {
            min: Some(0.0),
            max: None,
            exclusive_min: false,
        };
        assert!(non_negative.contains(0.0));
        assert!(!non_negative.contains(-0.1));
    }

    #[test]
    fn bounds_respect_inclusive_maximum() {
        let lat = NumberBounds {
            min: Some(-90.0),
            max: Some(90.0),
            exclusive_min: false,
        };
        assert!(lat.contains(90.0));
        assert!(lat.contains(-90.0));
        assert!(!lat.contains(90.5));
    }

    #[test]
    fn token_array_defaults_to_empty() {
        const TOKENS: &[&str] = &["a", "b"];
        let rule = token_array(TOKENS);
        assert_eq!(
            rule.default,
            Some(DefaultPolicy::Value {
                value: Value::Array(Vec::new())
            })
        );
        assert!(matches!(rule.kind, FieldKind::Array { .. }));
    }

    #[test]
    fn nullable_is_distinct_from_fixed_default() {
        assert!(text().or_null().is_nullable());
        assert!(!boolean().with_default(false).is_nullable());
        assert!(boolean().with_default(false).has_default());
        assert!(!boolean().has_default());
    }
}
