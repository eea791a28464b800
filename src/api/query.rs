//! Read-only queries over finished artifacts.
//!
//! "No curve for this species" and "risk data not available" are different
//! failures and stay distinct in [`LookupError`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::common::error::RiskError;
use crate::common::ids::SpeciesId;
use crate::data::domain::{DataRepo, PopulationRecord};
use crate::simulation::domain::{RiskPoint, RiskRepo};

/// Registry metadata file produced by the external fetch step.
pub const REGISTRY_FILE: &str = "iucn_species_data.json";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("species {0} not found")]
    NotFound(SpeciesId),

    #[error("risk data not available: {0}")]
    Unavailable(#[source] RiskError),
}

/// Risk curve for one species together with its latest count.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RiskLookup {
    pub species_id: SpeciesId,
    pub current_count: Option<u64>,
    pub risk_curve: Vec<RiskPoint>,
}

/// Latest observation per species; empty when no model has been trained yet.
pub fn list_species<D: DataRepo>(data: &D) -> Vec<PopulationRecord> {
    match data.load_last_rows() {
        Ok(rows) => rows.iter().map(|row| row.observation()).collect(),
        Err(err) => {
            debug!(ev = "query.species_unavailable", error = %err);
            Vec::new()
        }
    }
}

pub fn risk_lookup<D, R>(
    data: &D,
    risk: &R,
    species_id: &SpeciesId,
) -> Result<RiskLookup, LookupError>
where
    D: DataRepo,
    R: RiskRepo,
{
    let curves = risk.load_curves().map_err(LookupError::Unavailable)?;
    let curve = curves
        .into_iter()
        .find(|c| &c.species_id == species_id)
        .ok_or_else(|| LookupError::NotFound(species_id.clone()))?;

    let current_count = data.load_last_rows().ok().and_then(|rows| {
        rows.into_iter()
            .find(|row| &row.species_id == species_id)
            .map(|row| row.count)
    });

    Ok(RiskLookup {
        species_id: curve.species_id,
        current_count,
        risk_curve: curve.risk_curve,
    })
}

/// Pinned list entry: either a bare name or an object carrying `name`.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PinnedEntry {
    Name(String),
    Record { name: String },
}

impl PinnedEntry {
    pub fn name(&self) -> &str {
        match self {
            PinnedEntry::Name(name) | PinnedEntry::Record { name } => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PinnedSpecies {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_curve: Option<Vec<RiskPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

/// Join the pinned list with risk curves and registry metadata by name.
///
/// Every pinned entry is returned; missing risk data or metadata only leaves
/// the optional fields empty.
pub fn pinned<R: RiskRepo>(
    risk: &R,
    pinned_path: &Path,
    registry_path: &Path,
) -> Vec<PinnedSpecies> {
    let entries: Vec<PinnedEntry> = read_optional(pinned_path).unwrap_or_default();

    let curves: HashMap<String, Vec<RiskPoint>> = risk
        .load_curves()
        .map(|curves| {
            curves
                .into_iter()
                .map(|c| (c.species_id.to_string(), c.risk_curve))
                .collect()
        })
        .unwrap_or_default();

    let registry: HashMap<String, Value> = read_optional::<Vec<Value>>(registry_path)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.to_string();
            Some((name, item))
        })
        .collect();

    entries
        .iter()
        .map(|entry| {
            let name = entry.name();
            PinnedSpecies {
                name: name.to_string(),
                risk_curve: curves.get(name).cloned(),
                info: registry.get(name).cloned(),
            }
        })
        .collect()
}

fn read_optional<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read(path).ok()?;
    match serde_json::from_slice(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(ev = "query.unreadable", path = %path.display(), error = %err);
            None
        }
    }
}
