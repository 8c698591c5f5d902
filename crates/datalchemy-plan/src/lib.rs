//! Plan contracts and validation (stub for PIT Plan 1).

use serde::{Deserialize, Serialize};

/// Placeholder type until plan contracts are implemented.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlanPlaceholder;
