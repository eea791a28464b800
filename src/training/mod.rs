//! Growth Model Trainer: fits log-growth from covariates and records each
//! species' starting state for simulation.

pub mod boosting;
pub mod domain;
pub mod linear;
pub mod repo_fs;
pub mod service;

pub use domain::{FeatureVector, GrowthRegressor, ModelArtifact, ModelKind, ModelRepo, Regressor};
pub use repo_fs::FsModelRepo;
pub use service::{train, TrainOutcome};
