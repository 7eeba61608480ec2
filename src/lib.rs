pub mod canonical;
pub mod cli;
pub mod data;
pub mod dataset;
pub mod derive;
pub mod error;
pub mod export;
pub mod filter;
pub mod frequency;
pub mod io_utils;
pub mod loader;
pub mod normalize;
pub mod preview;
pub mod profile;
pub mod raw;
pub mod record;
pub mod stats;
pub mod table;

use std::{env, fs, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands, ProfilesArgs},
    profile::ProfileSet,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("workpulse", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => preview::execute(&args),
        Commands::Export(args) => export::execute(&args),
        Commands::Summary(args) => stats::execute_summary(&args),
        Commands::Group(args) => stats::execute_group(&args),
        Commands::Composition(args) => stats::execute_composition(&args),
        Commands::Frequency(args) => frequency::execute(&args),
        Commands::Correlate(args) => stats::execute_correlate(&args),
        Commands::Delta(args) => stats::execute_delta(&args),
        Commands::Profiles(args) => handle_profiles(&args),
    }
}

fn handle_profiles(args: &ProfilesArgs) -> Result<()> {
    let profiles = match &args.profiles {
        Some(path) => ProfileSet::load(path)
            .with_context(|| format!("Loading source profiles from {path:?}"))?,
        None => ProfileSet::builtin(),
    };
    let yaml = profiles.to_yaml_string()?;
    match args.output.as_deref().filter(|p| !io_utils::is_dash(p)) {
        Some(path) => {
            fs::write(path, yaml).with_context(|| format!("Writing profiles to {path:?}"))?;
            info!(
                "Wrote {} source profile(s) to {:?}",
                profiles.profiles.len(),
                path
            );
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
