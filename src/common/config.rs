//! Runtime configuration loaded from the process environment.
//!
//! Every knob has a default so a bare `risk run` works against `./data`.
//! Values that are present but unparseable are rejected instead of falling back.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::common::error::{RiskError, RiskResult};
use crate::simulation::domain::SimulationConfig;
use crate::training::domain::ModelKind;

/// Snapshot of configuration values consumed by the pipeline.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub data_root: PathBuf,
    pub models_root: PathBuf,
    pub log_level: String,
    pub feature_seed: u64,
    pub model_kind: ModelKind,
    pub simulation: SimulationConfig,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            models_root: PathBuf::from("./models"),
            log_level: "info".to_string(),
            feature_seed: 7,
            model_kind: ModelKind::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> RiskResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> RiskResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let sim = defaults.simulation;

        let cfg = Self {
            data_root: lookup("RISK_DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_root),
            models_root: lookup("RISK_MODELS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_root),
            log_level: lookup("RISK_LOG_LEVEL").unwrap_or(defaults.log_level),
            feature_seed: parsed(&lookup, "RISK_FEATURE_SEED", defaults.feature_seed)?,
            model_kind: parsed(&lookup, "RISK_MODEL_KIND", defaults.model_kind)?,
            simulation: SimulationConfig {
                horizon: parsed(&lookup, "RISK_HORIZON", sim.horizon)?,
                draws: parsed(&lookup, "RISK_DRAWS", sim.draws)?,
                sigma: parsed(&lookup, "RISK_SIGMA", sim.sigma)?,
                threshold: parsed(&lookup, "RISK_THRESHOLD", sim.threshold)?,
                seed: parsed(&lookup, "RISK_SIM_SEED", sim.seed)?,
                workers: parsed(&lookup, "RISK_WORKERS", sim.workers)?,
            },
        };

        cfg.simulation.validate()?;
        Ok(cfg)
    }

    /// Directory holding every tabular and JSON artifact.
    pub fn processed_dir(&self) -> PathBuf {
        self.data_root.join("processed")
    }

    /// User-curated pinned species list.
    pub fn pinned_path(&self) -> PathBuf {
        self.data_root.join("pinned_species.json")
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> RiskResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|err: T::Err| RiskError::invalid_config(key, format!("{raw:?}: {err}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cfg_from(pairs: &[(&str, &str)]) -> RiskResult<AppCfg> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppCfg::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = cfg_from(&[]).unwrap();
        assert_eq!(cfg.data_root, PathBuf::from("./data"));
        assert_eq!(cfg.feature_seed, 7);
        assert_eq!(cfg.simulation.horizon, 5);
        assert_eq!(cfg.simulation.draws, 400);
        assert_eq!(cfg.simulation.sigma, 0.25);
        assert_eq!(cfg.simulation.threshold, 50.0);
        assert_eq!(cfg.model_kind, ModelKind::GradientBoosting);
    }

    #[test]
    fn environment_overrides_apply() {
        let cfg = cfg_from(&[
            ("RISK_DATA_ROOT", "/tmp/risk"),
            ("RISK_HORIZON", "10"),
            ("RISK_MODEL_KIND", "linear"),
        ])
        .unwrap();
        assert_eq!(cfg.processed_dir(), PathBuf::from("/tmp/risk/processed"));
        assert_eq!(cfg.simulation.horizon, 10);
        assert_eq!(cfg.model_kind, ModelKind::Linear);
    }

    #[test]
    fn garbage_values_are_rejected() {
        let err = cfg_from(&[("RISK_DRAWS", "many")]).unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig { key: "RISK_DRAWS", .. }));

        let err = cfg_from(&[("RISK_SIGMA", "-1")]).unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig { .. }));
    }

    #[test]
    fn oversized_horizon_is_rejected() {
        let err = cfg_from(&[("RISK_HORIZON", "3000000000")]).unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig { key: "horizon", .. }));
    }
}
