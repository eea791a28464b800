//! Filesystem repository for the trained model artifact.

use std::path::PathBuf;

use crate::common::config::AppCfg;
use crate::common::error::{RiskError, RiskResult};
use crate::common::fs::{read_json, stage_json, Staged};

use super::domain::{ModelArtifact, ModelRepo};

pub const MODEL_FILE: &str = "baseline.json";

/// Persist the model artifact under `cfg.models_root`.
pub struct FsModelRepo {
    root: PathBuf,
}

impl FsModelRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(&cfg.models_root)
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn artefact_path(&self) -> PathBuf {
        self.root.join(MODEL_FILE)
    }
}

impl ModelRepo for FsModelRepo {
    fn stage_model(&self, model: &ModelArtifact) -> RiskResult<Staged> {
        stage_json(&self.artefact_path(), model)
    }

    /// Any failure to produce a usable model surfaces as `ModelUnavailable`.
    fn get_model(&self) -> RiskResult<ModelArtifact> {
        let path = self.artefact_path();
        let model: ModelArtifact = read_json("model", &path).map_err(|err| match err {
            RiskError::MissingArtifact { path, .. } => RiskError::model_unavailable(format!(
                "no trained model at {}; run train first",
                path.display()
            )),
            other => RiskError::model_unavailable(other.to_string()),
        })?;
        model.check_contract()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::training::domain::{FeatureVector, GrowthRegressor, ModelKind};

    #[test]
    fn missing_or_corrupt_model_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsModelRepo::at(dir.path());
        assert!(matches!(
            repo.get_model().unwrap_err(),
            RiskError::ModelUnavailable { .. }
        ));

        fs::write(repo.artefact_path(), b"{\"features\": 3").unwrap();
        assert!(matches!(
            repo.get_model().unwrap_err(),
            RiskError::ModelUnavailable { .. }
        ));
    }

    #[test]
    fn stored_model_predicts_like_the_original() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsModelRepo::at(dir.path());
        let x: Vec<FeatureVector> = (0..12)
            .map(|i| FeatureVector {
                count_lag: 40.0 + i as f64,
                forest_loss_pct: (i % 3) as f64,
                temp_anom: 0.1 * i as f64,
                prot_cov: 0.25,
            })
            .collect();
        let y: Vec<f64> = (0..12).map(|i| 0.01 * (i % 5) as f64 - 0.02).collect();
        let regressor = ModelKind::GradientBoosting.fit(&x, &y).unwrap();
        let model = ModelArtifact::new(regressor, 1, x.len());

        repo.put_model(&model).unwrap();
        let back = repo.get_model().unwrap();
        for f in &x {
            assert_eq!(
                model.regressor.predict(f).to_bits(),
                back.regressor.predict(f).to_bits()
            );
        }
    }
}
