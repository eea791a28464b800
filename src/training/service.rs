//! Growth model training and last-observed-row extraction.

use tracing::{info, warn};

use crate::common::error::{RiskError, RiskResult};
use crate::common::time::{self, Stopwatch};
use crate::data::domain::{DataRepo, TrainingRecord};
use crate::data::service::last_observed;

use super::domain::{FeatureVector, ModelArtifact, ModelKind, ModelRepo};

/// Artifacts produced by one training run.
#[derive(Clone, Debug)]
pub struct TrainOutcome {
    pub model: ModelArtifact,
    /// Latest row per species, ordered by species id.
    pub last_rows: Vec<TrainingRecord>,
    /// Rows skipped because a feature or the target was missing.
    pub skipped: usize,
}

/// Fit `kind` on every usable training row.
pub fn train(records: &[TrainingRecord], kind: ModelKind) -> RiskResult<TrainOutcome> {
    if records.is_empty() {
        return Err(RiskError::InsufficientData);
    }

    let mut x = Vec::with_capacity(records.len());
    let mut y = Vec::with_capacity(records.len());
    for record in records {
        let features = FeatureVector::from_record(record);
        if features.first_missing().is_none() && record.dlog_n.is_finite() {
            x.push(features);
            y.push(record.dlog_n);
        }
    }
    let skipped = records.len() - x.len();
    if skipped > 0 {
        warn!(ev = "train.rows_skipped", rows = skipped);
    }

    let regressor = kind.fit(&x, &y)?;
    let model = ModelArtifact::new(regressor, time::now_ms() as u64, x.len());
    let last_rows = last_observed(records).into_values().collect();

    Ok(TrainOutcome {
        model,
        last_rows,
        skipped,
    })
}

/// Train stage: training artifact in, model and last-rows artifacts out.
///
/// Both artifacts are staged before either is published, so a failed write
/// leaves the previous pair in place.
pub fn run<D, M>(data: &D, models: &M, kind: ModelKind) -> RiskResult<TrainOutcome>
where
    D: DataRepo,
    M: ModelRepo,
{
    let timer = Stopwatch::start();
    let records = data.load_training()?;
    info!(ev = "train.start", rows = records.len(), kind = kind.as_str());

    let outcome = train(&records, kind)?;
    let model = models.stage_model(&outcome.model)?;
    let last_rows = data.stage_last_rows(&outcome.last_rows)?;
    model.commit()?;
    last_rows.commit()?;

    info!(
        ev = "train.done",
        rows = outcome.model.rows,
        species = outcome.last_rows.len(),
        dur_ms = timer.elapsed_ms() as u64,
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::fs::Staged;
    use crate::data::domain::{log_growth, Covariates, PopulationRecord, RegionYearFeature};
    use crate::data::FsDataRepo;
    use crate::training::domain::GrowthRegressor;
    use crate::training::FsModelRepo;

    /// Delegates to a real repository but cannot write last rows.
    struct NoLastRows(FsDataRepo);

    impl DataRepo for NoLastRows {
        fn load_panel(&self) -> RiskResult<Vec<PopulationRecord>> {
            self.0.load_panel()
        }

        fn put_panel(&self, rows: &[PopulationRecord]) -> RiskResult<()> {
            self.0.put_panel(rows)
        }

        fn put_region_features(&self, rows: &[RegionYearFeature]) -> RiskResult<()> {
            self.0.put_region_features(rows)
        }

        fn put_training(&self, rows: &[TrainingRecord]) -> RiskResult<()> {
            self.0.put_training(rows)
        }

        fn load_training(&self) -> RiskResult<Vec<TrainingRecord>> {
            self.0.load_training()
        }

        fn stage_last_rows(&self, _: &[TrainingRecord]) -> RiskResult<Staged> {
            Err(RiskError::internal("disk full"))
        }

        fn load_last_rows(&self) -> RiskResult<Vec<TrainingRecord>> {
            self.0.load_last_rows()
        }
    }

    fn record(species: &str, year: i32, count: u64, count_lag: u64) -> TrainingRecord {
        TrainingRecord {
            species_id: species.into(),
            year,
            count,
            region_id: "R1".into(),
            covariates: Covariates {
                forest_loss_pct: 1.0 + f64::from(year - 2010) * 0.1,
                temp_anom: 0.2,
                prot_cov: 0.3,
            },
            count_lag,
            dlog_n: log_growth(count, count_lag),
        }
    }

    #[test]
    fn empty_dataset_is_insufficient() {
        let err = train(&[], ModelKind::GradientBoosting).unwrap_err();
        assert!(matches!(err, RiskError::InsufficientData));
    }

    #[test]
    fn last_rows_are_latest_per_species() {
        let rows = vec![
            record("B", 2012, 70, 75),
            record("A", 2011, 100, 110),
            record("A", 2013, 80, 90),
            record("A", 2012, 90, 100),
        ];
        let outcome = train(&rows, ModelKind::Linear).unwrap();
        let summary: Vec<(String, i32)> = outcome
            .last_rows
            .iter()
            .map(|r| (r.species_id.to_string(), r.year))
            .collect();
        assert_eq!(summary, vec![("A".to_string(), 2013), ("B".to_string(), 2012)]);
        assert_eq!(outcome.model.rows, 4);
    }

    #[test]
    fn incomplete_rows_are_skipped_not_fatal() {
        let mut rows = vec![record("A", 2011, 100, 110), record("A", 2012, 90, 100)];
        rows[0].covariates.temp_anom = f64::NAN;
        let outcome = train(&rows, ModelKind::GradientBoosting).unwrap();
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.model.rows, 1);

        let mu = outcome
            .model
            .predict(&FeatureVector::from_record(&rows[1]));
        assert!((mu - rows[1].dlog_n).abs() < 1e-12);
    }

    #[test]
    fn all_rows_incomplete_is_insufficient() {
        let mut rows = vec![record("A", 2011, 100, 110)];
        rows[0].covariates.prot_cov = f64::NAN;
        assert!(matches!(
            train(&rows, ModelKind::Linear).unwrap_err(),
            RiskError::InsufficientData
        ));
    }

    #[test]
    fn failed_last_rows_write_publishes_no_model() {
        let dir = tempfile::tempdir().unwrap();
        let data = NoLastRows(FsDataRepo::at(dir.path().join("processed")));
        let models = FsModelRepo::at(dir.path().join("models"));
        data.put_training(&[record("A", 2011, 100, 110), record("A", 2012, 90, 100)])
            .unwrap();

        let err = run(&data, &models, ModelKind::Linear).unwrap_err();
        assert!(matches!(err, RiskError::Internal { .. }));
        assert!(!models.artefact_path().exists());
        let leftovers = std::fs::read_dir(dir.path().join("models")).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
