//! Reference data and record schemas for ecoform.

pub mod tokens;
