//! Domain types for growth-model training and the persisted model artifact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::{RiskError, RiskResult};
use crate::common::fs::Staged;
use crate::data::domain::TrainingRecord;

use super::boosting::BoostedTrees;
use super::linear::LinearModel;

/// Named model input. Field names, not positions, carry meaning; the
/// positional form only exists inside the learners via [`FeatureVector::to_array`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FeatureVector {
    pub count_lag: f64,
    pub forest_loss_pct: f64,
    pub temp_anom: f64,
    pub prot_cov: f64,
}

impl FeatureVector {
    pub const LEN: usize = 4;

    /// Feature contract written into every artifact, in `to_array` order.
    pub const NAMES: [&'static str; Self::LEN] =
        ["count_lag", "forest_loss_pct", "temp_anom", "prot_cov"];

    pub fn from_record(record: &TrainingRecord) -> Self {
        Self {
            count_lag: record.count_lag as f64,
            forest_loss_pct: record.covariates.forest_loss_pct,
            temp_anom: record.covariates.temp_anom,
            prot_cov: record.covariates.prot_cov,
        }
    }

    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.count_lag,
            self.forest_loss_pct,
            self.temp_anom,
            self.prot_cov,
        ]
    }

    /// Name of the first missing or non-finite feature, if any.
    pub fn first_missing(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .zip(self.to_array())
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
    }
}

/// Narrow capability the simulator needs from a fitted model.
pub trait GrowthRegressor: Send + Sync {
    /// Expected log-growth for one feature vector.
    fn predict(&self, features: &FeatureVector) -> f64;
}

/// Supported learners.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    #[default]
    GradientBoosting,
    Linear,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::Linear => "linear",
        }
    }

    /// Fit the learner on aligned features and targets.
    pub fn fit(&self, x: &[FeatureVector], y: &[f64]) -> RiskResult<Regressor> {
        if x.is_empty() {
            return Err(RiskError::InsufficientData);
        }
        if x.len() != y.len() {
            return Err(RiskError::internal(format!(
                "{} feature rows for {} targets",
                x.len(),
                y.len()
            )));
        }
        Ok(match self {
            ModelKind::GradientBoosting => {
                Regressor::GradientBoosting(BoostedTrees::fit(x, y, &Default::default()))
            }
            ModelKind::Linear => Regressor::Linear(LinearModel::fit(x, y)?),
        })
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gradient_boosting" | "gbdt" => Ok(ModelKind::GradientBoosting),
            "linear" | "ols" => Ok(ModelKind::Linear),
            other => Err(format!("unknown model kind {other}")),
        }
    }
}

/// Fitted model, tagged by learner.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    GradientBoosting(BoostedTrees),
    Linear(LinearModel),
}

impl GrowthRegressor for Regressor {
    fn predict(&self, features: &FeatureVector) -> f64 {
        match self {
            Regressor::GradientBoosting(model) => model.predict(features),
            Regressor::Linear(model) => model.predict(features),
        }
    }
}

/// Persisted model: fitted regressor plus the feature contract it was trained on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub trained_ms: u64,
    pub rows: usize,
    pub regressor: Regressor,
}

impl ModelArtifact {
    pub fn new(regressor: Regressor, trained_ms: u64, rows: usize) -> Self {
        Self {
            features: FeatureVector::NAMES.iter().map(|s| s.to_string()).collect(),
            trained_ms,
            rows,
            regressor,
        }
    }

    /// Fail unless the stored contract matches [`FeatureVector::NAMES`] exactly.
    pub fn check_contract(&self) -> RiskResult<()> {
        if self.features.iter().map(String::as_str).eq(FeatureVector::NAMES) {
            Ok(())
        } else {
            Err(RiskError::model_unavailable(format!(
                "feature contract mismatch: artifact has {:?}, expected {:?}",
                self.features,
                FeatureVector::NAMES
            )))
        }
    }
}

impl GrowthRegressor for ModelArtifact {
    fn predict(&self, features: &FeatureVector) -> f64 {
        self.regressor.predict(features)
    }
}

/// Repository contract for model artifacts.
pub trait ModelRepo {
    /// Write the model without publishing it yet.
    fn stage_model(&self, model: &ModelArtifact) -> RiskResult<Staged>;
    fn put_model(&self, model: &ModelArtifact) -> RiskResult<()> {
        self.stage_model(model)?.commit()
    }
    fn get_model(&self) -> RiskResult<ModelArtifact>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_order_matches_names() {
        let fv = FeatureVector {
            count_lag: 1.0,
            forest_loss_pct: 2.0,
            temp_anom: 3.0,
            prot_cov: 4.0,
        };
        assert_eq!(fv.to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(FeatureVector::NAMES[2], "temp_anom");
        assert_eq!(fv.first_missing(), None);
    }

    #[test]
    fn first_missing_names_the_gap() {
        let fv = FeatureVector {
            count_lag: 1.0,
            forest_loss_pct: 2.0,
            temp_anom: f64::NAN,
            prot_cov: f64::INFINITY,
        };
        assert_eq!(fv.first_missing(), Some("temp_anom"));
    }

    #[test]
    fn permuted_contract_is_rejected() {
        let regressor = ModelKind::Linear
            .fit(
                &[FeatureVector {
                    count_lag: 10.0,
                    forest_loss_pct: 1.0,
                    temp_anom: 0.0,
                    prot_cov: 0.2,
                }],
                &[0.1],
            )
            .unwrap();
        let mut artifact = ModelArtifact::new(regressor, 0, 1);
        assert!(artifact.check_contract().is_ok());

        artifact.features.swap(1, 2);
        let err = artifact.check_contract().unwrap_err();
        assert!(matches!(err, RiskError::ModelUnavailable { .. }));
    }

    #[test]
    fn learner_kind_is_tagged_inside_the_regressor() {
        let x = [FeatureVector {
            count_lag: 10.0,
            forest_loss_pct: 1.0,
            temp_anom: 0.0,
            prot_cov: 0.2,
        }];
        let regressor = ModelKind::Linear.fit(&x, &[0.1]).unwrap();
        let value = serde_json::to_value(ModelArtifact::new(regressor, 5, 1)).unwrap();

        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, ["features", "regressor", "rows", "trained_ms"]);
        assert_eq!(value["regressor"]["kind"], "linear");
        assert!(value["regressor"]["coefficients"].is_array());
    }

    #[test]
    fn model_kind_parses_aliases() {
        assert_eq!("gbdt".parse::<ModelKind>().unwrap(), ModelKind::GradientBoosting);
        assert_eq!("linear".parse::<ModelKind>().unwrap(), ModelKind::Linear);
        assert!("forest".parse::<ModelKind>().is_err());
    }

    #[test]
    fn fitting_nothing_is_insufficient() {
        let err = ModelKind::GradientBoosting.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, RiskError::InsufficientData));
    }
}
