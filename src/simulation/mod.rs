//! Risk Simulator: Monte Carlo quasi-extinction curves per species.

pub mod domain;
pub mod engine;
pub mod repo_fs;
pub mod service;
pub mod workers;

pub use domain::{
    RiskCurve, RiskPoint, RiskRepo, SimulationConfig, SimulationError, SimulationReport,
    SpeciesFailure,
};
pub use repo_fs::FsRiskRepo;
pub use service::simulate;
