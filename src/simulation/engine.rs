//! Monte Carlo projection for a single species.
//!
//! The expected log-growth `mu` is predicted once from the species' last
//! observed covariates and held fixed. Every horizon year is an independent
//! batch of draws from the same starting count: year `h` is not compounded
//! from year `h - 1`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::common::ids::{SeedHash, SpeciesId};
use crate::data::domain::TrainingRecord;
use crate::training::domain::{FeatureVector, GrowthRegressor};

use super::domain::{RiskCurve, RiskPoint, SimulationConfig, SimulationError};

/// Fraction of `draws` samples with `start_count * exp(mu + sigma * z) < threshold`.
pub fn tail_fraction<R: Rng + ?Sized>(
    rng: &mut R,
    start_count: u64,
    mu: f64,
    sigma: f64,
    draws: usize,
    threshold: f64,
) -> f64 {
    if draws == 0 {
        return 0.0;
    }
    let start = start_count as f64;
    let below = (0..draws)
        .filter(|_| {
            let z: f64 = rng.sample(StandardNormal);
            start * (mu + sigma * z).exp() < threshold
        })
        .count();
    below as f64 / draws as f64
}

/// Risk curve for a species whose expected growth is already known.
pub fn project_with_mu(
    species_id: &SpeciesId,
    last_year: i32,
    start_count: u64,
    mu: f64,
    cfg: &SimulationConfig,
) -> Result<RiskCurve, SimulationError> {
    let final_year = i32::try_from(cfg.horizon)
        .ok()
        .and_then(|h| last_year.checked_add(h))
        .ok_or(SimulationError::YearOutOfRange {
            last_year,
            horizon: cfg.horizon,
        })?;

    let mut rng = ChaCha8Rng::seed_from_u64(SeedHash::species_seed(cfg.seed, species_id));
    let risk_curve = (last_year + 1..=final_year)
        .map(|year| RiskPoint {
            year,
            p: tail_fraction(&mut rng, start_count, mu, cfg.sigma, cfg.draws, cfg.threshold),
        })
        .collect();

    Ok(RiskCurve {
        species_id: species_id.clone(),
        risk_curve,
    })
}

/// Predict `mu` from the last observed row and project the species.
pub fn project_species(
    last: &TrainingRecord,
    model: &dyn GrowthRegressor,
    cfg: &SimulationConfig,
) -> Result<RiskCurve, SimulationError> {
    let features = FeatureVector::from_record(last);
    if let Some(feature) = features.first_missing() {
        return Err(SimulationError::MissingFeature {
            feature: feature.to_string(),
        });
    }

    let mu = model.predict(&features);
    if !mu.is_finite() {
        return Err(SimulationError::NonFinitePrediction {
            value: mu.to_string(),
        });
    }

    project_with_mu(&last.species_id, last.year, last.count, mu, cfg)
}
