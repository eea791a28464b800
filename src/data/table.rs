//! Columnar table codec.
//!
//! Tabular artifacts are stored column-major:
//! `{"rows": n, "columns": {"species_id": [...], "year": [...], ...}}`.
//! Float columns encode missing or non-finite values as `null` and read them
//! back as NaN so downstream stages can decide how to treat the gap.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::common::error::{RiskError, RiskResult};
use crate::common::ids::{RegionId, SpeciesId};

use super::domain::{Covariates, PopulationRecord, RegionYearFeature, TrainingRecord};

/// On-disk envelope shared by every table.
#[derive(Serialize, Deserialize)]
pub struct Table<C> {
    pub rows: usize,
    pub columns: C,
}

/// Conversion between row records and their column-major form.
pub trait Columnar: Sized {
    type Columns: Serialize + DeserializeOwned;

    /// Artifact name used in error messages.
    const ARTIFACT: &'static str;

    fn to_columns(rows: &[Self]) -> Self::Columns;
    fn from_columns(columns: Self::Columns, rows: usize) -> RiskResult<Vec<Self>>;
}

pub fn encode<R: Columnar>(rows: &[R]) -> Table<R::Columns> {
    Table {
        rows: rows.len(),
        columns: R::to_columns(rows),
    }
}

pub fn decode<R: Columnar>(table: Table<R::Columns>) -> RiskResult<Vec<R>> {
    R::from_columns(table.columns, table.rows)
}

fn check_len<T>(artifact: &'static str, name: &str, column: &[T], rows: usize) -> RiskResult<()> {
    if column.len() == rows {
        Ok(())
    } else {
        Err(RiskError::malformed(
            artifact,
            format!("column {name} has {} values, expected {rows}", column.len()),
        ))
    }
}

fn float_cell(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

fn float_value(cell: Option<f64>) -> f64 {
    cell.unwrap_or(f64::NAN)
}

#[derive(Serialize, Deserialize)]
pub struct PanelColumns {
    pub species_id: Vec<SpeciesId>,
    pub year: Vec<i32>,
    pub count: Vec<u64>,
    pub region_id: Vec<RegionId>,
}

impl Columnar for PopulationRecord {
    type Columns = PanelColumns;
    const ARTIFACT: &'static str = "population panel";

    fn to_columns(rows: &[Self]) -> PanelColumns {
        PanelColumns {
            species_id: rows.iter().map(|r| r.species_id.clone()).collect(),
            year: rows.iter().map(|r| r.year).collect(),
            count: rows.iter().map(|r| r.count).collect(),
            region_id: rows.iter().map(|r| r.region_id.clone()).collect(),
        }
    }

    fn from_columns(c: PanelColumns, rows: usize) -> RiskResult<Vec<Self>> {
        check_len(Self::ARTIFACT, "species_id", &c.species_id, rows)?;
        check_len(Self::ARTIFACT, "year", &c.year, rows)?;
        check_len(Self::ARTIFACT, "count", &c.count, rows)?;
        check_len(Self::ARTIFACT, "region_id", &c.region_id, rows)?;

        Ok(c.species_id
            .into_iter()
            .zip(c.year)
            .zip(c.count)
            .zip(c.region_id)
            .map(|(((species_id, year), count), region_id)| PopulationRecord {
                species_id,
                year,
                count,
                region_id,
            })
            .collect())
    }
}

#[derive(Serialize, Deserialize)]
pub struct FeatureColumns {
    pub region_id: Vec<RegionId>,
    pub year: Vec<i32>,
    pub forest_loss_pct: Vec<Option<f64>>,
    pub temp_anom: Vec<Option<f64>>,
    pub prot_cov: Vec<Option<f64>>,
}

impl Columnar for RegionYearFeature {
    type Columns = FeatureColumns;
    const ARTIFACT: &'static str = "region features";

    fn to_columns(rows: &[Self]) -> FeatureColumns {
        FeatureColumns {
            region_id: rows.iter().map(|r| r.region_id.clone()).collect(),
            year: rows.iter().map(|r| r.year).collect(),
            forest_loss_pct: rows
                .iter()
                .map(|r| float_cell(r.covariates.forest_loss_pct))
                .collect(),
            temp_anom: rows.iter().map(|r| float_cell(r.covariates.temp_anom)).collect(),
            prot_cov: rows.iter().map(|r| float_cell(r.covariates.prot_cov)).collect(),
        }
    }

    fn from_columns(c: FeatureColumns, rows: usize) -> RiskResult<Vec<Self>> {
        check_len(Self::ARTIFACT, "region_id", &c.region_id, rows)?;
        check_len(Self::ARTIFACT, "year", &c.year, rows)?;
        check_len(Self::ARTIFACT, "forest_loss_pct", &c.forest_loss_pct, rows)?;
        check_len(Self::ARTIFACT, "temp_anom", &c.temp_anom, rows)?;
        check_len(Self::ARTIFACT, "prot_cov", &c.prot_cov, rows)?;

        Ok((0..rows)
            .map(|i| RegionYearFeature {
                region_id: c.region_id[i].clone(),
                year: c.year[i],
                covariates: Covariates {
                    forest_loss_pct: float_value(c.forest_loss_pct[i]),
                    temp_anom: float_value(c.temp_anom[i]),
                    prot_cov: float_value(c.prot_cov[i]),
                },
            })
            .collect())
    }
}

#[derive(Serialize, Deserialize)]
pub struct TrainingColumns {
    pub species_id: Vec<SpeciesId>,
    pub year: Vec<i32>,
    pub count: Vec<u64>,
    pub region_id: Vec<RegionId>,
    pub forest_loss_pct: Vec<Option<f64>>,
    pub temp_anom: Vec<Option<f64>>,
    pub prot_cov: Vec<Option<f64>>,
    pub count_lag: Vec<u64>,
    #[serde(rename = "dlogN")]
    pub dlog_n: Vec<Option<f64>>,
}

impl Columnar for TrainingRecord {
    type Columns = TrainingColumns;
    const ARTIFACT: &'static str = "training dataset";

    fn to_columns(rows: &[Self]) -> TrainingColumns {
        TrainingColumns {
            species_id: rows.iter().map(|r| r.species_id.clone()).collect(),
            year: rows.iter().map(|r| r.year).collect(),
            count: rows.iter().map(|r| r.count).collect(),
            region_id: rows.iter().map(|r| r.region_id.clone()).collect(),
            forest_loss_pct: rows
                .iter()
                .map(|r| float_cell(r.covariates.forest_loss_pct))
                .collect(),
            temp_anom: rows.iter().map(|r| float_cell(r.covariates.temp_anom)).collect(),
            prot_cov: rows.iter().map(|r| float_cell(r.covariates.prot_cov)).collect(),
            count_lag: rows.iter().map(|r| r.count_lag).collect(),
            dlog_n: rows.iter().map(|r| float_cell(r.dlog_n)).collect(),
        }
    }

    fn from_columns(c: TrainingColumns, rows: usize) -> RiskResult<Vec<Self>> {
        check_len(Self::ARTIFACT, "species_id", &c.species_id, rows)?;
        check_len(Self::ARTIFACT, "year", &c.year, rows)?;
        check_len(Self::ARTIFACT, "count", &c.count, rows)?;
        check_len(Self::ARTIFACT, "region_id", &c.region_id, rows)?;
        check_len(Self::ARTIFACT, "forest_loss_pct", &c.forest_loss_pct, rows)?;
        check_len(Self::ARTIFACT, "temp_anom", &c.temp_anom, rows)?;
        check_len(Self::ARTIFACT, "prot_cov", &c.prot_cov, rows)?;
        check_len(Self::ARTIFACT, "count_lag", &c.count_lag, rows)?;
        check_len(Self::ARTIFACT, "dlogN", &c.dlog_n, rows)?;

        Ok((0..rows)
            .map(|i| TrainingRecord {
                species_id: c.species_id[i].clone(),
                year: c.year[i],
                count: c.count[i],
                region_id: c.region_id[i].clone(),
                covariates: Covariates {
                    forest_loss_pct: float_value(c.forest_loss_pct[i]),
                    temp_anom: float_value(c.temp_anom[i]),
                    prot_cov: float_value(c.prot_cov[i]),
                },
                count_lag: c.count_lag[i],
                dlog_n: float_value(c.dlog_n[i]),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn panel_round_trips_through_columns() {
        let rows = vec![
            PopulationRecord {
                species_id: "A".into(),
                year: 2010,
                count: 80,
                region_id: "R1".into(),
            },
            PopulationRecord {
                species_id: "B".into(),
                year: 2011,
                count: 12,
                region_id: "R2".into(),
            },
        ];
        let text = serde_json::to_string(&encode(&rows)).unwrap();
        let table: Table<PanelColumns> = serde_json::from_str(&text).unwrap();
        assert_eq!(decode::<PopulationRecord>(table).unwrap(), rows);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let raw = json!({
            "rows": 2,
            "columns": {
                "species_id": ["A", "B"],
                "year": [2010],
                "count": [1, 2],
                "region_id": ["R1", "R1"]
            }
        });
        let table: Table<PanelColumns> = serde_json::from_value(raw).unwrap();
        let err = decode::<PopulationRecord>(table).unwrap_err();
        assert!(matches!(err, RiskError::MalformedTable { .. }));
    }

    #[test]
    fn null_covariates_read_back_as_missing() {
        let raw = json!({
            "rows": 1,
            "columns": {
                "species_id": ["A"],
                "year": [2012],
                "count": [40],
                "region_id": ["R1"],
                "forest_loss_pct": [null],
                "temp_anom": [0.2],
                "prot_cov": [0.4],
                "count_lag": [44],
                "dlogN": [-0.1]
            }
        });
        let table: Table<TrainingColumns> = serde_json::from_value(raw).unwrap();
        let rows = decode::<TrainingRecord>(table).unwrap();
        assert!(rows[0].covariates.forest_loss_pct.is_nan());
        assert!(!rows[0].covariates.is_complete());

        let encoded = serde_json::to_value(encode(&rows)).unwrap();
        assert_eq!(encoded["columns"]["forest_loss_pct"], json!([null]));
    }
}
