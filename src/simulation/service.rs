//! Risk simulation orchestration across species.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::common::error::RiskResult;
use crate::common::time::Stopwatch;
use crate::data::domain::{DataRepo, TrainingRecord};
use crate::training::domain::{GrowthRegressor, ModelRepo};

use super::domain::{RiskRepo, SimulationConfig, SimulationReport, SpeciesFailure};
use super::engine::project_species;
use super::workers;

/// Project every species in parallel, isolating per-species failures.
///
/// Each species draws from its own seeded stream, so the report does not
/// depend on the worker count or on completion order.
pub fn simulate(
    last_rows: &[TrainingRecord],
    model: &dyn GrowthRegressor,
    cfg: &SimulationConfig,
) -> RiskResult<SimulationReport> {
    cfg.validate()?;
    let pool = workers::pool(cfg.workers)?;

    let outcomes: Vec<_> = pool.install(|| {
        last_rows
            .par_iter()
            .map(|row| (row, project_species(row, model, cfg)))
            .collect()
    });

    let mut report = SimulationReport::default();
    for (row, outcome) in outcomes {
        match outcome {
            Ok(curve) => {
                report.curves.insert(row.species_id.clone(), curve);
            }
            Err(error) => {
                warn!(
                    ev = "simulate.species_failed",
                    species_id = %row.species_id,
                    error = %error,
                );
                report.failures.push(SpeciesFailure {
                    species_id: row.species_id.clone(),
                    error,
                });
            }
        }
    }
    report
        .failures
        .sort_by(|a, b| a.species_id.cmp(&b.species_id));
    Ok(report)
}

/// Simulate stage: model and last-rows artifacts in, risk curves out.
///
/// The model is loaded first so a missing model leaves no output behind.
pub fn run<D, M, R>(
    data: &D,
    models: &M,
    risk: &R,
    cfg: &SimulationConfig,
) -> RiskResult<SimulationReport>
where
    D: DataRepo,
    M: ModelRepo,
    R: RiskRepo,
{
    let timer = Stopwatch::start();
    cfg.validate()?;
    let model = models.get_model()?;
    let last_rows = data.load_last_rows()?;
    info!(
        ev = "simulate.start",
        species = last_rows.len(),
        horizon = cfg.horizon,
        draws = cfg.draws as u64,
        seed = cfg.seed,
    );

    let report = simulate(&last_rows, &model, cfg)?;
    risk.put_curves(&report.curve_list())?;
    risk.put_failures(&report.failures)?;

    info!(
        ev = "simulate.done",
        curves = report.curves.len(),
        failures = report.failures.len(),
        dur_ms = timer.elapsed_ms() as u64,
    );
    Ok(report)
}
