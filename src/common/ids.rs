//! Identifier newtypes and deterministic seed hashing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a monitored species.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(String);

impl SpeciesId {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpeciesId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a geographic region.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 64-bit FNV-1a hash used to derive per-entity RNG seeds.
///
/// Stable across platforms and releases, unlike `std`'s `DefaultHasher`.
#[derive(Copy, Clone, Debug)]
pub struct SeedHash(u64);

impl SeedHash {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    pub fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        for b in bytes {
            self.0 = (self.0 ^ u64::from(*b)).wrapping_mul(Self::PRIME);
        }
        self
    }

    /// Feed a length-prefixed string so that ("ab", "c") and ("a", "bc") differ.
    pub fn update_str(&mut self, value: &str) -> &mut Self {
        self.update(&(value.len() as u64).to_le_bytes());
        self.update(value.as_bytes())
    }

    pub fn finish(&self) -> u64 {
        self.0
    }

    /// Seed for one species' simulation stream.
    pub fn species_seed(base: u64, species: &SpeciesId) -> u64 {
        Self::new()
            .update(&base.to_le_bytes())
            .update_str(species.as_str())
            .finish()
    }

    /// Seed for one region-year covariate draw.
    pub fn region_year_seed(base: u64, region: &RegionId, year: i32) -> u64 {
        Self::new()
            .update(&base.to_le_bytes())
            .update_str(region.as_str())
            .update(&year.to_le_bytes())
            .finish()
    }
}

impl Default for SeedHash {
    fn default() -> Self {
        Self::new()
    }
}
