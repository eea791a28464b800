//! Feature Builder: region-year covariates, lagged counts and growth targets.

pub mod domain;
pub mod service;

pub use domain::CovariateModel;
pub use service::{build_features, build_training_set, derive_region_features, FeatureSet};
