//! serve command - Run the HTTP facade over rclone

use clap::Args;
use cx_core::Result;
use cx_rclone::RcloneGateway;

use super::context::{fail, load_config};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (defaults to rclone.bind from the config)
    #[arg(long)]
    pub bind: Option<String>,

    /// Allowed CORS origin; repeat for several (replaces the configured list)
    #[arg(long = "origin")]
    pub origins: Vec<String>,
}

pub async fn execute(args: ServeArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(args, &formatter).await {
        Ok(()) => ExitCode::Success,
        Err(e) => fail(&formatter, "Server error", &e),
    }
}

async fn run(args: ServeArgs, formatter: &Formatter) -> Result<()> {
    let config = load_config()?;
    let bind = args.bind.unwrap_or(config.rclone.bind);
    let origins = if args.origins.is_empty() {
        config.rclone.allowed_origins
    } else {
        args.origins
    };

    let gateway = RcloneGateway::with_binary(config.rclone.binary);

    cx_rclone::serve(
        &bind,
        gateway,
        &origins,
        |addr| formatter.success(&format!("Serving rclone facade on http://{addr}")),
        async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        },
    )
    .await
}
