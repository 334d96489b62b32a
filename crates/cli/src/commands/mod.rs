//! CLI command definitions and execution
//!
//! Each subcommand module exposes its clap arguments and an `execute`
//! function returning an [`ExitCode`].

use clap::{Parser, Subcommand};
use cx_core::{ConfigManager, Defaults};

use crate::exit_code::ExitCode;
use crate::output::OutputConfig;

mod completions;
mod config;
mod context;
mod filter;
mod onedrive;
mod rclone;
mod s3;
mod serve;
mod transfer;

/// cx - move files between Amazon S3 and Microsoft OneDrive
///
/// Lists buckets, drives and folders, copies selected items in either
/// direction and serves an HTTP facade over rclone.
#[derive(Parser, Debug)]
#[command(name = "cx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List S3 buckets and objects
    #[command(subcommand)]
    S3(s3::S3Commands),

    /// List OneDrive drives, folders and files
    Onedrive(onedrive::OneDriveArgs),

    /// Copy selected items between S3 and OneDrive
    Transfer(transfer::TransferArgs),

    /// Use the local rclone installation
    #[command(subcommand)]
    Rclone(rclone::RcloneCommands),

    /// Serve the rclone HTTP facade
    Serve(serve::ServeArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    }
    .with_defaults(&configured_defaults());

    match cli.command {
        Commands::S3(cmd) => s3::execute(cmd, output_config).await,
        Commands::Onedrive(args) => onedrive::execute(args, output_config).await,
        Commands::Transfer(args) => transfer::execute(args, output_config).await,
        Commands::Rclone(cmd) => rclone::execute(cmd, output_config).await,
        Commands::Serve(args) => serve::execute(args, output_config).await,
        Commands::Config(cmd) => config::execute(cmd, output_config),
        Commands::Completions(args) => completions::execute(args),
    }
}

/// The `[defaults]` table of the config file
///
/// A config that cannot be read is reported by the command that needs it,
/// so output falls back to the built-in defaults here.
fn configured_defaults() -> Defaults {
    match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            tracing::debug!(error = %e, "using built-in output defaults");
            Defaults::default()
        }
    }
}
