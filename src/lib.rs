// lib.rs - pipeline stages and shared plumbing
pub mod api;
pub mod common;
pub mod data;
pub mod features;
pub mod simulation;
pub mod training;

pub use common::{RiskCode, RiskError, RiskResult};
