//! `risk` command line: one subcommand per pipeline stage plus artifact queries.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use extinction_risk::api::{self, LookupError};
use extinction_risk::common::config::AppCfg;
use extinction_risk::common::ids::SpeciesId;
use extinction_risk::common::log;
use extinction_risk::data::FsDataRepo;
use extinction_risk::features::{self, CovariateModel};
use extinction_risk::simulation::{self, FsRiskRepo};
use extinction_risk::training::{self, FsModelRepo, ModelKind};
use extinction_risk::{RiskCode, RiskError};

#[derive(Parser, Debug)]
#[command(
    name = "risk",
    about = "Project quasi-extinction risk from population counts"
)]
struct Args {
    /// Root holding `processed/` artifacts (overrides RISK_DATA_ROOT)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    /// Directory for the model artifact (overrides RISK_MODELS_ROOT)
    #[arg(long, global = true)]
    models_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Derive covariates, lags and growth targets from the population panel
    FeatureBuild {
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fit the growth model and record the last observation per species
    Train {
        #[arg(long)]
        model: Option<ModelKind>,
    },
    /// Run the Monte Carlo projection for every species
    Simulate(SimArgs),
    /// feature-build, train and simulate in sequence
    Run(SimArgs),
    /// List the latest observation per species
    Species,
    /// Show the risk curve of one species
    Risk { species_id: String },
    /// Join the pinned species list with risk curves and registry metadata
    Pinned,
}

#[derive(clap::Args, Debug)]
struct SimArgs {
    #[arg(long)]
    horizon: Option<u32>,
    #[arg(long)]
    draws: Option<usize>,
    #[arg(long)]
    sigma: Option<f64>,
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    workers: Option<usize>,
}

impl SimArgs {
    fn apply(&self, cfg: &mut AppCfg) {
        let sim = &mut cfg.simulation;
        sim.horizon = self.horizon.unwrap_or(sim.horizon);
        sim.draws = self.draws.unwrap_or(sim.draws);
        sim.sigma = self.sigma.unwrap_or(sim.sigma);
        sim.threshold = self.threshold.unwrap_or(sim.threshold);
        sim.seed = self.seed.unwrap_or(sim.seed);
        sim.workers = self.workers.unwrap_or(sim.workers);
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(lookup) = err.downcast_ref::<LookupError>() {
        return match lookup {
            LookupError::NotFound(_) => 44,
            LookupError::Unavailable(_) => 50,
        };
    }
    match err.downcast_ref::<RiskError>() {
        Some(risk) => risk.code() as u8,
        None => RiskCode::Internal as u8,
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let mut cfg = AppCfg::load()?;
    if let Some(root) = args.data_root {
        cfg.data_root = root;
    }
    if let Some(root) = args.models_root {
        cfg.models_root = root;
    }
    log::init(&cfg.log_level)?;

    let data = FsDataRepo::new(&cfg);
    let models = FsModelRepo::new(&cfg);
    let risk = FsRiskRepo::new(&cfg);

    match args.command {
        Command::FeatureBuild { seed } => {
            let covariates = CovariateModel::new(seed.unwrap_or(cfg.feature_seed));
            features::service::run(&data, &covariates).context("feature-build failed")?;
        }
        Command::Train { model } => {
            training::service::run(&data, &models, model.unwrap_or(cfg.model_kind))
                .context("train failed")?;
        }
        Command::Simulate(sim) => {
            sim.apply(&mut cfg);
            simulation::service::run(&data, &models, &risk, &cfg.simulation)
                .context("simulate failed")?;
        }
        Command::Run(sim) => {
            sim.apply(&mut cfg);
            features::service::run(&data, &CovariateModel::new(cfg.feature_seed))
                .context("feature-build failed")?;
            training::service::run(&data, &models, cfg.model_kind).context("train failed")?;
            simulation::service::run(&data, &models, &risk, &cfg.simulation)
                .context("simulate failed")?;
        }
        Command::Species => print_json(&api::list_species(&data))?,
        Command::Risk { species_id } => {
            let found = api::risk_lookup(&data, &risk, &SpeciesId::new(species_id))?;
            print_json(&found)?;
        }
        Command::Pinned => {
            let registry = cfg.processed_dir().join(api::query::REGISTRY_FILE);
            print_json(&api::pinned(&risk, &cfg.pinned_path(), &registry))?;
        }
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
