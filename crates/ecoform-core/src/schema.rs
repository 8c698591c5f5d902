use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::rule::{DefaultPolicy, FieldKind, FieldRule};
use crate::validate::check_primitive;

/// An ordered mapping from field name to rule.
///
/// Built once at startup, immutable thereafter, and shared read-only
/// between validation and derivation. Nested sections hold their own
/// `ObjectSchema` behind an `Arc` so common sub-schemas can be reused
/// across many fields without duplication.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectSchema {
    fields: Vec<(String, FieldRule)>,
}

impl ObjectSchema {
    /// Build a schema from `(name, rule)` pairs, preserving declaration order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldRule)>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, rule)| (name.into(), rule))
                .collect(),
        }
    }

    /// Iterate fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldRule)> {
        self.fields.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field rule by name.
    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, rule)| rule)
    }

    /// Union of two schemas; on collision the later definition wins.
    ///
    /// Colliding fields keep their position in `self`; fields unique to
    /// `other` are appended in `other`'s order. Used to layer a
    /// specialized variant on top of a generic base.
    pub fn merge(&self, other: &ObjectSchema) -> ObjectSchema {
        let mut fields: Vec<(String, FieldRule)> = self
            .fields
            .iter()
            .map(|(name, rule)| {
                let rule = other.get(name).unwrap_or(rule);
                (name.clone(), rule.clone())
            })
            .collect();
        for (name, rule) in &other.fields {
            if self.get(name).is_none() {
                fields.push((name.clone(), rule.clone()));
            }
        }
        ObjectSchema { fields }
    }

    /// Validate internal consistency of the schema tree.
    ///
    /// Checks, recursively:
    /// - duplicate field names within an object
    /// - fixed defaults that violate their own rule
    pub fn check(&self) -> Result<()> {
        self.check_at("$")
    }

    fn check_at(&self, path: &str) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (name, rule) in self.fields() {
            if !seen.insert(name) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field name: {path}.{name}"
                )));
            }
            check_rule(rule, &format!("{path}.{name}"))?;
        }
        Ok(())
    }
}

fn check_rule(rule: &FieldRule, path: &str) -> Result<()> {
    if let Some(DefaultPolicy::Value { value }) = &rule.default {
        if let Some((_, message)) = check_primitive(&rule.kind, value) {
            return Err(Error::InvalidSchema(format!(
                "default value violates its own rule at {path}: {message}"
            )));
        }
    }
    match &rule.kind {
        FieldKind::Array { element } => check_rule(element, path),
        FieldKind::Object { schema } => schema.check_at(path),
        FieldKind::Token { tokens } if tokens.is_empty() => Err(Error::InvalidSchema(format!(
            "empty token set at {path}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{boolean, non_negative_number, text, token};
    use serde_json::json;

    #[test]
    fn merge_later_definition_wins_and_preserves_order() {
        let base = ObjectSchema::new([
            ("alpha", text()),
            ("beta", non_negative_number()),
            ("gamma", boolean()),
        ]);
        let overlay = ObjectSchema::new([
            ("beta", text().described("now textual")),
            ("delta", boolean()),
        ]);

        let merged = base.merge(&overlay);
        let names: Vec<&str> = merged.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["alpha", "beta", "gamma", "delta"]);

        let beta = merged.get("beta").unwrap();
        assert!(matches!(beta.kind, FieldKind::Text { .. }));
        assert_eq!(beta.description.as_deref(), Some("now textual"));
    }

    #[test]
    fn check_rejects_duplicate_field_names() {
        let schema = ObjectSchema::new([("twice", text()), ("twice", boolean())]);
        let err = schema.check().unwrap_err();
        assert!(err.to_string().contains("duplicate field name"));
    }

    #[test]
    fn check_rejects_defaults_violating_their_rule() {
        let schema =
            ObjectSchema::new([("count", non_negative_number().with_default(json!(-1)))]);
        let err = schema.check().unwrap_err();
        assert!(err.to_string().contains("default value"));
    }

    #[test]
    fn check_rejects_empty_token_sets() {
        const EMPTY: &[&str] = &[];
        let schema = ObjectSchema::new([("choice", token(EMPTY))]);
        assert!(schema.check().is_err());
    }

    #[test]
    fn check_accepts_null_defaults_on_any_kind() {
        let schema = ObjectSchema::new([("note", text().or_null())]);
        assert!(schema.check().is_ok());
    }
}
