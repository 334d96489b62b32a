//! s3 command - List buckets and objects

use clap::{Args, Subcommand};
use cx_core::{Config, ListingService, RemoteEntity, Result};

use super::context::{fail, load_config, object_store, print_entities};
use super::filter::KeyFilter;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

#[derive(Subcommand, Debug)]
pub enum S3Commands {
    /// List buckets visible to the configured keys
    Buckets,

    /// List objects in a bucket
    Ls(LsArgs),
}

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Bucket to list (defaults to s3.bucket from the config)
    pub bucket: Option<String>,

    /// Only list keys under this prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Only list keys matching this glob pattern
    #[arg(long)]
    pub include: Option<String>,
}

pub async fn execute(cmd: S3Commands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let result = match &cmd {
        S3Commands::Buckets => list_buckets(&formatter).await,
        S3Commands::Ls(args) => list_objects(args, &formatter).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => fail(&formatter, "Failed to list S3", &e),
    }
}

async fn listing() -> Result<(ListingService, Config)> {
    let config = load_config()?;
    let store = object_store(&config).await?;
    Ok((ListingService::new().with_object_store(store), config))
}

async fn list_buckets(formatter: &Formatter) -> Result<ExitCode> {
    let (service, _) = listing().await?;
    let buckets: Vec<RemoteEntity> = service
        .list_buckets()
        .await?
        .into_iter()
        .map(RemoteEntity::bucket)
        .collect();

    print_entities(formatter, &buckets, false);
    Ok(ExitCode::Success)
}

async fn list_objects(args: &LsArgs, formatter: &Formatter) -> Result<ExitCode> {
    let filter = KeyFilter::new(args.include.as_deref())?;
    let (service, config) = listing().await?;

    let Some(bucket) = args.bucket.clone().or(config.s3.bucket) else {
        formatter.error("No bucket given and s3.bucket is not configured");
        return Ok(ExitCode::UsageError);
    };

    let spinner = ProgressBar::spinner(formatter.config(), &format!("Listing {bucket}..."));
    let objects = service.list_objects(&bucket, &args.prefix).await;
    spinner.finish_and_clear();

    let objects: Vec<RemoteEntity> = objects?
        .into_iter()
        .filter(|o| filter.matches(&o.id))
        .collect();

    print_entities(formatter, &objects, false);
    Ok(ExitCode::Success)
}
