//! Feature building: covariate derivation, join, lag and growth target.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::common::error::{RiskError, RiskResult};
use crate::common::ids::RegionId;
use crate::common::time::Stopwatch;
use crate::data::domain::{
    log_growth, Covariates, DataRepo, PopulationRecord, RegionYearFeature, TrainingRecord,
};
use crate::data::service::validate_panel;

use super::domain::CovariateModel;

/// Output of a feature-build run.
#[derive(Clone, Debug)]
pub struct FeatureSet {
    pub region_features: Vec<RegionYearFeature>,
    pub training: Vec<TrainingRecord>,
}

/// One feature row per distinct `(region_id, year)` of the panel, in key order.
pub fn derive_region_features(
    panel: &[PopulationRecord],
    model: &CovariateModel,
) -> Vec<RegionYearFeature> {
    let keys: BTreeSet<(&RegionId, i32)> =
        panel.iter().map(|row| (&row.region_id, row.year)).collect();
    keys.into_iter()
        .map(|(region, year)| model.feature(region, year))
        .collect()
}

/// Join covariates onto the panel, compute lags and growth, drop lagless rows.
///
/// The lag is the count of the species' previous observed row, whatever the
/// year distance. Only each species' first row is dropped.
pub fn build_training_set(
    panel: &[PopulationRecord],
    features: &[RegionYearFeature],
) -> RiskResult<Vec<TrainingRecord>> {
    let lookup: BTreeMap<(&RegionId, i32), Covariates> = features
        .iter()
        .map(|f| ((&f.region_id, f.year), f.covariates))
        .collect();

    let mut joined: Vec<(&PopulationRecord, Covariates)> = panel
        .iter()
        .map(|row| {
            lookup
                .get(&(&row.region_id, row.year))
                .map(|cov| (row, *cov))
                .ok_or_else(|| RiskError::MissingFeature {
                    region_id: row.region_id.to_string(),
                    year: row.year,
                })
        })
        .collect::<RiskResult<_>>()?;

    joined.sort_by(|(a, _), (b, _)| {
        a.species_id
            .cmp(&b.species_id)
            .then_with(|| a.year.cmp(&b.year))
    });

    let mut out = Vec::with_capacity(joined.len());
    let mut gaps = 0usize;
    for pair in joined.windows(2) {
        let (prev, _) = pair[0];
        let (row, covariates) = pair[1];
        if prev.species_id != row.species_id {
            continue;
        }
        if prev.year + 1 != row.year {
            gaps += 1;
        }
        out.push(TrainingRecord {
            species_id: row.species_id.clone(),
            year: row.year,
            count: row.count,
            region_id: row.region_id.clone(),
            covariates,
            count_lag: prev.count,
            dlog_n: log_growth(row.count, prev.count),
        });
    }

    if gaps > 0 {
        debug!(ev = "features.lag_spans_gap", rows = gaps);
    }
    Ok(out)
}

/// Derive features for a panel under `model`'s seed.
pub fn build_features(
    panel: &[PopulationRecord],
    model: &CovariateModel,
) -> RiskResult<FeatureSet> {
    validate_panel(panel)?;
    let region_features = derive_region_features(panel, model);
    let training = build_training_set(panel, &region_features)?;
    Ok(FeatureSet {
        region_features,
        training,
    })
}

/// Feature-build stage: panel artifact in, features and training artifacts out.
pub fn run<R: DataRepo>(repo: &R, model: &CovariateModel) -> RiskResult<FeatureSet> {
    let timer = Stopwatch::start();
    let panel = repo.load_panel()?;
    info!(ev = "features.start", panel_rows = panel.len(), seed = model.seed());

    let set = build_features(&panel, model)?;
    repo.put_region_features(&set.region_features)?;
    repo.put_training(&set.training)?;

    info!(
        ev = "features.done",
        region_years = set.region_features.len(),
        training_rows = set.training.len(),
        dur_ms = timer.elapsed_ms() as u64,
    );
    Ok(set)
}
