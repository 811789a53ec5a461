//! ACS CLI - Command-line interface for the access control system
//!
//! Provides commands for:
//! - Evaluating access requests
//! - Querying and purging the access log
//! - Administering badges, employees, groups and resources
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use acs_core::config::Config;
use commands::{
    admin::AdminCommand, check::CheckCommand, config::ConfigCommand, logs::LogsCommand,
    purge::PurgeCommand, status::StatusCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "acs", version, about = "Badge-based access control")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate an access request and record the decision
    Check(CheckCommand),
    /// Query the access log
    Logs(LogsCommand),
    /// Delete access log entries past the retention window
    Purge(PurgeCommand),
    /// Show what the entity cache holds
    Status(StatusCommand),
    /// Manage badges, employees, groups and resources
    #[command(subcommand)]
    Admin(AdminCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path);

    // Setup tracing
    let level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Check(cmd) => cmd.execute(&config, format).await,
        Commands::Logs(cmd) => cmd.execute(&config, format).await,
        Commands::Purge(cmd) => cmd.execute(&config, format).await,
        Commands::Status(cmd) => cmd.execute(&config, format).await,
        Commands::Admin(cmd) => cmd.execute(&config, format).await,
        Commands::Config(cmd) => cmd.execute(&config_path, format).await,
    }
}
