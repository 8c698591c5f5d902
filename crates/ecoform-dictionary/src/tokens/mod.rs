//! Enumerated token sets referenced by the dictionary.
//!
//! These are static reference data, not engineering: the validation core
//! consumes each list as an opaque set of permitted string tokens. Lists
//! follow the external taxonomies they are named after (ISO 3166/4217,
//! IECC, IBC, OmniClass, ASHRAE 240P); their content is maintained by
//! domain review, not by code.

mod building;
mod energy;
mod geography;
mod lca;
mod scopes;

pub use building::*;
pub use energy::*;
pub use geography::*;
pub use lca::*;
pub use scopes::*;
