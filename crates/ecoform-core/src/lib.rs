//! Core contracts and helpers for ecoform.
//!
//! This crate defines the reusable primitive validators, the composite
//! schema builder, the validation entry point, and JSON Schema derivation
//! shared by the dictionary and the CLI.

pub mod context;
pub mod derive;
pub mod error;
mod phone;
pub mod rule;
pub mod schema;
pub mod validate;

pub use context::{AmbientSource, FixedAmbient, SystemAmbient};
pub use derive::derive_json_schema;
pub use error::{Error, IssueSeverity, Result, ValidationIssue, ValidationReport};
pub use rule::{DefaultPolicy, FieldKind, FieldRule, NumberBounds};
pub use schema::ObjectSchema;
pub use validate::{ValidatedRecord, validate_record};
