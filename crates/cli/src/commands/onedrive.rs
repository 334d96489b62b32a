//! onedrive command - List drives, folders and files
//!
//! Every subcommand signs in first. Item ids printed in the ID column are
//! what `cx transfer` expects for `--drive`, `--folder` and `--item`.

use clap::{Args, Subcommand};
use cx_core::{ListingService, ROOT_FOLDER, RemoteEntity, Result};

use super::context::{AuthArg, drive_store, fail, load_config, print_entities};
use super::filter::KeyFilter;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Args, Debug)]
pub struct OneDriveArgs {
    /// Sign-in flow (defaults to client-credential when a secret is configured)
    #[arg(long, value_enum, global = true)]
    pub auth: Option<AuthArg>,

    #[command(subcommand)]
    pub command: OneDriveCommands,
}

#[derive(Subcommand, Debug)]
pub enum OneDriveCommands {
    /// List items at the root of the signed-in user's drive
    Root,

    /// List drives available to the signed-in user
    Drives,

    /// List sub-folders of a folder
    Folders(FolderArgs),

    /// List files directly inside a folder
    Files(FilesArgs),
}

#[derive(Args, Debug)]
pub struct FolderArgs {
    /// Drive id
    pub drive: String,

    /// Folder item id
    #[arg(short, long, default_value = ROOT_FOLDER)]
    pub folder: String,
}

#[derive(Args, Debug)]
pub struct FilesArgs {
    #[command(flatten)]
    pub location: FolderArgs,

    /// Only list names matching this glob pattern
    #[arg(long)]
    pub include: Option<String>,
}

pub async fn execute(args: OneDriveArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&args, &formatter).await {
        Ok(entities) => {
            print_entities(&formatter, &entities, true);
            ExitCode::Success
        }
        Err(e) => fail(&formatter, "Failed to list OneDrive", &e),
    }
}

async fn run(args: &OneDriveArgs, formatter: &Formatter) -> Result<Vec<RemoteEntity>> {
    let filter = match &args.command {
        OneDriveCommands::Files(files) => KeyFilter::new(files.include.as_deref())?,
        _ => KeyFilter::default(),
    };

    let config = load_config()?;
    let store = drive_store(&config, args.auth, formatter).await?;
    let service = ListingService::new().with_drive_store(store);

    match &args.command {
        OneDriveCommands::Root => service.list_root_children().await,
        OneDriveCommands::Drives => service.list_drives().await,
        OneDriveCommands::Folders(location) => {
            service
                .list_folders(&location.drive, &location.folder)
                .await
        }
        OneDriveCommands::Files(files) => {
            let location = &files.location;
            let entries = service
                .list_files(&location.drive, &location.folder)
                .await?;
            Ok(entries
                .into_iter()
                .filter(|f| filter.matches(&f.name))
                .collect())
        }
    }
}
