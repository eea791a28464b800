//! Filesystem repository for risk curves and per-species failures.

use std::path::PathBuf;

use crate::common::config::AppCfg;
use crate::common::error::RiskResult;
use crate::common::fs::{read_json, write_json_atomic};

use super::domain::{RiskCurve, RiskRepo, SpeciesFailure};

pub const RISK_CURVES_FILE: &str = "risk_curves.json";
pub const RISK_FAILURES_FILE: &str = "risk_failures.json";

pub struct FsRiskRepo {
    root: PathBuf,
}

impl FsRiskRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(cfg.processed_dir())
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn curves_path(&self) -> PathBuf {
        self.root.join(RISK_CURVES_FILE)
    }

    pub fn failures_path(&self) -> PathBuf {
        self.root.join(RISK_FAILURES_FILE)
    }
}

impl RiskRepo for FsRiskRepo {
    fn put_curves(&self, curves: &[RiskCurve]) -> RiskResult<()> {
        write_json_atomic(&self.curves_path(), curves)
    }

    fn load_curves(&self) -> RiskResult<Vec<RiskCurve>> {
        read_json("risk curves", &self.curves_path())
    }

    fn put_failures(&self, failures: &[SpeciesFailure]) -> RiskResult<()> {
        write_json_atomic(&self.failures_path(), failures)
    }
}
