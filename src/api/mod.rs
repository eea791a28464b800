//! Public entry points for consumers of the finished artifacts.

pub mod query;

pub use query::{list_species, pinned, risk_lookup, LookupError, PinnedSpecies, RiskLookup};
