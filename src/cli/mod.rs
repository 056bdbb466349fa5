//! Command-line surface

pub mod context;
pub mod export;
pub mod flow;
pub mod history_stats;
pub mod import;
pub mod output;
pub mod project;
pub mod run;
pub mod telemetry;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use context::AppContext;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    " ",
    env!("BUILD_DATE"),
    ")"
);

/// Headless front-end for the Flowdeck flow editor.
#[derive(Parser)]
#[command(name = "flowdeck", version, long_version = LONG_VERSION)]
#[command(about = "Compose, validate and run browser-automation flows")]
pub struct Cli {
    /// Path to a config file (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects
    Project(project::ProjectArgs),

    /// Manage flows within a project
    Flow(flow::FlowArgs),

    /// Execute a flow against the automation backend
    Run(run::RunArgs),

    /// Check a flow's structure and report editor lints
    Validate(validate::ValidateArgs),

    /// Export a flow through the backend (canonical JSON or generated code)
    Export(export::ExportArgs),

    /// Analyze an existing script or JSON into a new flow
    Import(import::ImportArgs),

    /// Report undo-history compression stats over a flow's revisions
    HistoryStats(history_stats::HistoryStatsArgs),
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let _guard = telemetry::init(cli.verbose, config.log_dir().as_deref())?;
    let ctx = AppContext::init(config, cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Project(args) => project::execute(&ctx, args),
        Commands::Flow(args) => flow::execute(&ctx, args),
        Commands::Run(args) => run::execute(&ctx, args).await,
        Commands::Validate(args) => validate::execute(&ctx, args),
        Commands::Export(args) => export::execute(&ctx, args).await,
        Commands::Import(args) => import::execute(&ctx, args).await,
        Commands::HistoryStats(args) => history_stats::execute(&ctx, args),
    }
}
