//! Shared utilities that glue the pipeline stages together.
pub mod config;
pub mod error;
pub mod fs;
pub mod ids;
pub mod log;
pub mod time;

pub use error::{RiskCode, RiskError, RiskResult};
pub use ids::{RegionId, SeedHash, SpeciesId};
