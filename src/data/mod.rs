//! Data domain: record types, columnar artifacts and panel validation.

pub mod domain;
pub mod repo_fs;
pub mod service;
pub mod table;

pub use domain::{
    log_growth, Covariates, DataRepo, PopulationRecord, RegionYearFeature, TrainingRecord,
};
pub use repo_fs::FsDataRepo;
