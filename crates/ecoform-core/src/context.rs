use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

/// Ambient clock and identifier source used to resolve computed defaults.
///
/// Validation never reads global state directly; callers inject one of
/// these, which keeps computed defaults deterministic under test.
pub trait AmbientSource {
    /// Today's calendar date.
    fn today(&self) -> NaiveDate;

    /// A freshly generated identifier.
    fn new_id(&self) -> Uuid;

    /// The current calendar year.
    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Ambient source backed by the UTC system clock and random v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAmbient;

impl AmbientSource for SystemAmbient {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic ambient source for tests and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedAmbient {
    pub today: NaiveDate,
    pub id: Uuid,
}

impl AmbientSource for FixedAmbient {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn new_id(&self) -> Uuid {
        self.id
    }
}
