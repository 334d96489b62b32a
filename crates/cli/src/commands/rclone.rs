//! rclone command - Remotes, listings and copies through the local rclone

use clap::{Args, Subcommand};
use cx_core::Result;
use cx_rclone::RcloneGateway;
use serde_json::json;

use super::context::{fail, load_config};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar, file_entry_table};

#[derive(Subcommand, Debug)]
pub enum RcloneCommands {
    /// List configured rclone remotes
    Remotes,

    /// List entries under remote:path
    Ls(RcloneLsArgs),

    /// Copy between two remotes
    Copy(RcloneCopyArgs),
}

#[derive(Args, Debug)]
pub struct RcloneLsArgs {
    /// Remote name, without the trailing colon
    pub remote: String,

    /// Path inside the remote
    #[arg(default_value = "")]
    pub path: String,
}

#[derive(Args, Debug)]
pub struct RcloneCopyArgs {
    pub src_remote: String,

    #[arg(long, default_value = "")]
    pub src_path: String,

    pub dest_remote: String,

    #[arg(long, default_value = "")]
    pub dest_path: String,
}

pub async fn execute(cmd: RcloneCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&cmd, &formatter).await {
        Ok(code) => code,
        Err(e) => fail(&formatter, "rclone", &e),
    }
}

async fn run(cmd: &RcloneCommands, formatter: &Formatter) -> Result<ExitCode> {
    let config = load_config()?;
    let gateway = RcloneGateway::with_binary(&config.rclone.binary);

    match cmd {
        RcloneCommands::Remotes => {
            let remotes = gateway.list_remotes().await?;
            if formatter.is_json() {
                formatter.json(&json!({ "remotes": remotes }));
            } else {
                for remote in &remotes {
                    formatter.println(remote);
                }
            }
        }
        RcloneCommands::Ls(args) => {
            let entries = gateway.list_path(&args.remote, &args.path).await?;
            if formatter.is_json() {
                formatter.json(&entries);
            } else if entries.is_empty() {
                formatter.println("(empty)");
            } else {
                formatter.println(&file_entry_table(&entries).to_string());
            }
        }
        RcloneCommands::Copy(args) => {
            let spinner = ProgressBar::spinner(
                formatter.config(),
                &format!("Copying {} to {}...", args.src_remote, args.dest_remote),
            );
            let summary = gateway
                .copy(
                    &args.src_remote,
                    &args.src_path,
                    &args.dest_remote,
                    &args.dest_path,
                )
                .await;
            spinner.finish_and_clear();

            let summary = summary?;
            if formatter.is_json() {
                formatter.json(&summary);
            } else {
                formatter.success(&summary.message);
                if !summary.details.trim().is_empty() {
                    formatter.println(summary.details.trim_end());
                }
            }
        }
    }
    Ok(ExitCode::Success)
}
