mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use import_estimator::util::config::load_config;
use import_estimator::util::version::{version_label, APP_AUTHOR, APP_NAME, VERSION};

use crate::cli::{
    run_catalog, run_config, run_containers, run_cost, CatalogArgs, ConfigArgs, ContainersArgs,
    CostArgs,
};

/// Container loading and landed-cost estimates for import shipments.
#[derive(Parser, Debug)]
#[command(name = "import-estimator", version = VERSION, author = APP_AUTHOR, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare 20ft, 40ft and 40ft HC loading and recommend FCL or LCL.
    Containers(ContainersArgs),

    /// Select the duty rate and compute the KRW landed cost.
    Cost(CostArgs),

    /// List the container envelopes in use.
    Catalog(CatalogArgs),

    /// Print the effective configuration, or write the defaults with --init.
    Config(ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{APP_NAME} {} starting", version_label());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let config = load_config(config_path)?;

    match &cli.command {
        Commands::Containers(args) => run_containers(args, &config),
        Commands::Cost(args) => run_cost(args, &config),
        Commands::Catalog(args) => run_catalog(args, &config),
        Commands::Config(args) => run_config(args, &config, config_path),
    }
}
