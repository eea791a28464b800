//! Error handling primitives shared across the pipeline stages.
//!
//! Structural problems (missing upstream artifacts, empty datasets, broken
//! tables) abort a stage through [`RiskError`]. Anomalies that only affect a
//! single species during simulation live in `simulation::domain` instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Stable error codes, also used as the CLI exit status.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RiskCode {
    /// Success code used as a sentinel.
    Ok = 0,
    /// Filesystem or encoding failure.
    Io = 1,
    /// A required upstream artifact was not found.
    MissingArtifact = 2,
    /// Input table failed validation.
    InvalidInput = 3,
    /// A panel row had no derived region-year feature.
    MissingFeature = 4,
    /// Training was requested on an empty dataset.
    InsufficientData = 5,
    /// The model artifact could not be loaded.
    ModelUnavailable = 6,
    /// Configuration value rejected.
    InvalidConfig = 7,
    /// Catch-all for bugs.
    Internal = 8,
}

/// Canonical error type for the pipeline.
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid json in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{artifact} artifact not found at {}; run the upstream stage first", path.display())]
    MissingArtifact { artifact: &'static str, path: PathBuf },

    #[error("malformed {artifact} table: {reason}")]
    MalformedTable { artifact: &'static str, reason: String },

    #[error("duplicate observation for species {species_id} in year {year}")]
    DuplicateObservation { species_id: String, year: i32 },

    #[error("no derived feature for region {region_id} in year {year}")]
    MissingFeature { region_id: String, year: i32 },

    #[error("training dataset is empty")]
    InsufficientData,

    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },

    #[error("invalid configuration for {key}: {reason}")]
    InvalidConfig { key: &'static str, reason: String },

    #[error("internal error: {reason}")]
    Internal { reason: String },
}

/// Result alias used throughout the crate.
pub type RiskResult<T> = Result<T, RiskError>;

impl RiskError {
    /// Machine parsable code for this error.
    pub fn code(&self) -> RiskCode {
        match self {
            RiskError::Io { .. } | RiskError::Json { .. } => RiskCode::Io,
            RiskError::MissingArtifact { .. } => RiskCode::MissingArtifact,
            RiskError::MalformedTable { .. } | RiskError::DuplicateObservation { .. } => {
                RiskCode::InvalidInput
            }
            RiskError::MissingFeature { .. } => RiskCode::MissingFeature,
            RiskError::InsufficientData => RiskCode::InsufficientData,
            RiskError::ModelUnavailable { .. } => RiskCode::ModelUnavailable,
            RiskError::InvalidConfig { .. } => RiskCode::InvalidConfig,
            RiskError::Internal { .. } => RiskCode::Internal,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RiskError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        RiskError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(artifact: &'static str, reason: impl Into<String>) -> Self {
        RiskError::MalformedTable {
            artifact,
            reason: reason.into(),
        }
    }

    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        RiskError::ModelUnavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(key: &'static str, reason: impl Into<String>) -> Self {
        RiskError::InvalidConfig {
            key,
            reason: reason.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        RiskError::Internal {
            reason: reason.into(),
        }
    }
}
