//! Panel validation and ordering helpers.

use std::collections::{BTreeMap, HashSet};

use crate::common::error::{RiskError, RiskResult};
use crate::common::ids::SpeciesId;

use super::domain::{PopulationRecord, TrainingRecord};

/// Reject panels with more than one row per `(species_id, year)`.
pub fn validate_panel(panel: &[PopulationRecord]) -> RiskResult<()> {
    let mut seen = HashSet::with_capacity(panel.len());
    for row in panel {
        if !seen.insert((&row.species_id, row.year)) {
            return Err(RiskError::DuplicateObservation {
                species_id: row.species_id.to_string(),
                year: row.year,
            });
        }
    }
    Ok(())
}

/// Chronologically latest training row per species, keyed by species.
pub fn last_observed(rows: &[TrainingRecord]) -> BTreeMap<SpeciesId, TrainingRecord> {
    let mut latest: BTreeMap<SpeciesId, TrainingRecord> = BTreeMap::new();
    for row in rows {
        match latest.get(&row.species_id) {
            Some(current) if current.year >= row.year => {}
            _ => {
                latest.insert(row.species_id.clone(), row.clone());
            }
        }
    }
    latest
}
