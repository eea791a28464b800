//! Domain definitions for risk projection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::error::{RiskError, RiskResult};
use crate::common::ids::SpeciesId;

/// Longest supported projection, in years.
pub const MAX_HORIZON: u32 = 1_000;

/// Monte Carlo settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    /// Number of future years per curve.
    pub horizon: u32,
    /// Draws per horizon year.
    pub draws: usize,
    /// Standard deviation of simulated log-growth.
    pub sigma: f64,
    /// Quasi-extinction threshold in individuals.
    pub threshold: f64,
    /// Base seed; each species derives its own stream from it.
    pub seed: u64,
    /// Worker threads, `0` for rayon's default.
    pub workers: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            horizon: 5,
            draws: 400,
            sigma: 0.25,
            threshold: 50.0,
            seed: 42,
            workers: 0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> RiskResult<()> {
        if self.horizon == 0 {
            return Err(RiskError::invalid_config("horizon", "must be at least 1"));
        }
        if self.horizon > MAX_HORIZON {
            return Err(RiskError::invalid_config(
                "horizon",
                format!("{} exceeds the maximum of {MAX_HORIZON}", self.horizon),
            ));
        }
        if self.draws == 0 {
            return Err(RiskError::invalid_config("draws", "must be at least 1"));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(RiskError::invalid_config(
                "sigma",
                format!("{} is not a positive finite number", self.sigma),
            ));
        }
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(RiskError::invalid_config(
                "threshold",
                format!("{} is not a positive finite number", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Probability of being under the threshold in one projected year.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskPoint {
    pub year: i32,
    pub p: f64,
}

/// Projected risk for one species over the horizon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskCurve {
    pub species_id: SpeciesId,
    pub risk_curve: Vec<RiskPoint>,
}

/// Failure isolated to a single species.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationError {
    #[error("feature {feature} is missing")]
    MissingFeature { feature: String },

    #[error("model predicted a non-finite growth rate ({value})")]
    NonFinitePrediction { value: String },

    #[error("projecting {horizon} years past {last_year} leaves the year range")]
    YearOutOfRange { last_year: i32, horizon: u32 },
}

/// Recorded per-species failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesFailure {
    pub species_id: SpeciesId,
    pub error: SimulationError,
}

/// Everything one simulate run produced.
#[derive(Clone, Debug, Default)]
pub struct SimulationReport {
    pub curves: BTreeMap<SpeciesId, RiskCurve>,
    pub failures: Vec<SpeciesFailure>,
}

impl SimulationReport {
    /// Curves in species order, ready for serialisation.
    pub fn curve_list(&self) -> Vec<RiskCurve> {
        self.curves.values().cloned().collect()
    }
}

/// Repository contract for risk artifacts.
pub trait RiskRepo {
    fn put_curves(&self, curves: &[RiskCurve]) -> RiskResult<()>;
    fn load_curves(&self) -> RiskResult<Vec<RiskCurve>>;
    fn put_failures(&self, failures: &[SpeciesFailure]) -> RiskResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn degenerate_settings_are_rejected() {
        let base = SimulationConfig::default();
        for bad in [
            SimulationConfig { horizon: 0, ..base },
            SimulationConfig {
                horizon: MAX_HORIZON + 1,
                ..base
            },
            SimulationConfig { draws: 0, ..base },
            SimulationConfig { sigma: 0.0, ..base },
            SimulationConfig { sigma: f64::NAN, ..base },
            SimulationConfig { threshold: -5.0, ..base },
        ] {
            assert!(matches!(bad.validate(), Err(RiskError::InvalidConfig { .. })));
        }
    }

    #[test]
    fn curve_serialises_with_year_and_p() {
        let curve = RiskCurve {
            species_id: "CA_CONDOR".into(),
            risk_curve: vec![RiskPoint { year: 2026, p: 0.25 }],
        };
        let value = serde_json::to_value(&curve).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "species_id": "CA_CONDOR",
                "risk_curve": [{"year": 2026, "p": 0.25}]
            })
        );
    }
}
