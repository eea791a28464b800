//! Filesystem-backed repository for the tabular artifacts.

use std::path::PathBuf;

use crate::common::config::AppCfg;
use crate::common::error::RiskResult;
use crate::common::fs::{read_json, stage_json, write_json_atomic, Staged};

use super::domain::{DataRepo, PopulationRecord, RegionYearFeature, TrainingRecord};
use super::table::{self, Columnar, Table};

pub const PANEL_FILE: &str = "population_panel.json";
pub const REGION_FEATURES_FILE: &str = "region_features.json";
pub const TRAINING_FILE: &str = "training.json";
pub const LAST_ROWS_FILE: &str = "last_rows.json";

/// Filesystem repository rooted at `<data_root>/processed`.
pub struct FsDataRepo {
    root: PathBuf,
}

impl FsDataRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(cfg.processed_dir())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    fn put<R: Columnar>(&self, file: &str, rows: &[R]) -> RiskResult<()> {
        write_json_atomic(&self.path(file), &table::encode(rows))
    }

    fn stage<R: Columnar>(&self, file: &str, rows: &[R]) -> RiskResult<Staged> {
        stage_json(&self.path(file), &table::encode(rows))
    }

    fn load<R: Columnar>(&self, file: &str) -> RiskResult<Vec<R>> {
        let table: Table<R::Columns> = read_json(R::ARTIFACT, &self.path(file))?;
        table::decode(table)
    }
}

impl DataRepo for FsDataRepo {
    fn load_panel(&self) -> RiskResult<Vec<PopulationRecord>> {
        self.load(PANEL_FILE)
    }

    fn put_panel(&self, rows: &[PopulationRecord]) -> RiskResult<()> {
        self.put(PANEL_FILE, rows)
    }

    fn put_region_features(&self, rows: &[RegionYearFeature]) -> RiskResult<()> {
        self.put(REGION_FEATURES_FILE, rows)
    }

    fn put_training(&self, rows: &[TrainingRecord]) -> RiskResult<()> {
        self.put(TRAINING_FILE, rows)
    }

    fn load_training(&self) -> RiskResult<Vec<TrainingRecord>> {
        self.load(TRAINING_FILE)
    }

    fn stage_last_rows(&self, rows: &[TrainingRecord]) -> RiskResult<Staged> {
        self.stage(LAST_ROWS_FILE, rows)
    }

    fn load_last_rows(&self) -> RiskResult<Vec<TrainingRecord>> {
        self.load(LAST_ROWS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::RiskError;

    #[test]
    fn panel_survives_a_write_read_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsDataRepo::at(dir.path());
        let rows = vec![PopulationRecord {
            species_id: "SAGE_GROUSE".into(),
            year: 2015,
            count: 131,
            region_id: "R3".into(),
        }];

        repo.put_panel(&rows).unwrap();
        assert_eq!(repo.load_panel().unwrap(), rows);
    }

    #[test]
    fn absent_training_set_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsDataRepo::at(dir.path());
        let err = repo.load_training().unwrap_err();
        assert!(matches!(
            err,
            RiskError::MissingArtifact {
                artifact: "training dataset",
                ..
            }
        ));
    }
}
