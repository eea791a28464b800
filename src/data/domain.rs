//! Core record definitions shared by every pipeline stage.

use serde::{Deserialize, Serialize};

use crate::common::error::RiskResult;
use crate::common::fs::Staged;
use crate::common::ids::{RegionId, SpeciesId};

/// One observed population count from the external panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationRecord {
    pub species_id: SpeciesId,
    pub year: i32,
    pub count: u64,
    pub region_id: RegionId,
}

/// Environmental and protection covariates for one region-year.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Covariates {
    /// Percentage of forest lost, within `[0, 100]`.
    pub forest_loss_pct: f64,
    /// Temperature anomaly, unbounded.
    pub temp_anom: f64,
    /// Protected-area coverage fraction, within `[0, 1]`.
    pub prot_cov: f64,
}

impl Covariates {
    /// Whether every value is present and finite.
    pub fn is_complete(&self) -> bool {
        self.forest_loss_pct.is_finite() && self.temp_anom.is_finite() && self.prot_cov.is_finite()
    }
}

/// Derived covariates keyed by region and year.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionYearFeature {
    pub region_id: RegionId,
    pub year: i32,
    #[serde(flatten)]
    pub covariates: Covariates,
}

/// Panel row joined with its covariates, its lag and its growth target.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingRecord {
    pub species_id: SpeciesId,
    pub year: i32,
    pub count: u64,
    pub region_id: RegionId,
    pub covariates: Covariates,
    /// Count at the same species' previous observed row.
    pub count_lag: u64,
    /// `ln(count + 1) - ln(count_lag + 1)`.
    pub dlog_n: f64,
}

impl TrainingRecord {
    pub fn observation(&self) -> PopulationRecord {
        PopulationRecord {
            species_id: self.species_id.clone(),
            year: self.year,
            count: self.count,
            region_id: self.region_id.clone(),
        }
    }
}

/// Log growth between consecutive counts, shifted by one to tolerate zeros.
pub fn log_growth(count: u64, count_lag: u64) -> f64 {
    ((count as f64) + 1.0).ln() - ((count_lag as f64) + 1.0).ln()
}

/// Repository contract for the tabular artifacts.
pub trait DataRepo {
    fn load_panel(&self) -> RiskResult<Vec<PopulationRecord>>;
    fn put_panel(&self, rows: &[PopulationRecord]) -> RiskResult<()>;
    fn put_region_features(&self, rows: &[RegionYearFeature]) -> RiskResult<()>;
    fn put_training(&self, rows: &[TrainingRecord]) -> RiskResult<()>;
    fn load_training(&self) -> RiskResult<Vec<TrainingRecord>>;
    /// Write the last rows without publishing them yet.
    fn stage_last_rows(&self, rows: &[TrainingRecord]) -> RiskResult<Staged>;
    fn put_last_rows(&self, rows: &[TrainingRecord]) -> RiskResult<()> {
        self.stage_last_rows(rows)?.commit()
    }
    fn load_last_rows(&self) -> RiskResult<Vec<TrainingRecord>>;
}
