//! transfer command - Copy selected items between S3 and OneDrive
//!
//! Selections are explicit keys or item ids, optionally widened by an
//! `--include` glob over a listing. Items run one at a time; a failed item
//! is reported and the batch continues. Ctrl+C stops the batch after the
//! item in flight.

use std::sync::Arc;

use clap::{Args, Subcommand};
use cx_core::{
    Direction, DriveStore, Error, ListingService, ObjectStore, ROOT_FOLDER, RemoteEntity, Result,
    SessionContext, TaskStatus, TransferExecutor, TransferOrchestrator, TransferReport,
    TransferTask,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::context::{AuthArg, drive_store, fail, load_config, object_store};
use super::filter::KeyFilter;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar, report_table};

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// OneDrive sign-in flow (defaults to client-credential when a secret is configured)
    #[arg(long, value_enum, global = true)]
    pub auth: Option<AuthArg>,

    #[command(subcommand)]
    pub command: TransferCommands,
}

#[derive(Subcommand, Debug)]
pub enum TransferCommands {
    /// Copy S3 objects into a OneDrive folder
    S3ToOnedrive(S3ToOneDriveArgs),

    /// Copy OneDrive files into an S3 bucket
    OnedriveToS3(OneDriveToS3Args),
}

/// Bucket, drive and folder shared by both directions
#[derive(Args, Debug)]
pub struct Endpoints {
    /// S3 bucket (defaults to s3.bucket from the config)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// OneDrive drive id
    #[arg(short, long)]
    pub drive: String,

    /// OneDrive folder item id
    #[arg(short, long, default_value = ROOT_FOLDER)]
    pub folder: String,

    /// S3 key prefix: listing scope for --include, or destination prefix
    #[arg(short, long, default_value = "")]
    pub prefix: String,

    /// Select every key or file name matching this glob pattern
    #[arg(long)]
    pub include: Option<String>,
}

#[derive(Args, Debug)]
pub struct S3ToOneDriveArgs {
    #[command(flatten)]
    pub endpoints: Endpoints,

    /// Object keys to copy
    pub keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct OneDriveToS3Args {
    #[command(flatten)]
    pub endpoints: Endpoints,

    /// OneDrive item ids of files in the folder
    #[arg(short, long = "item")]
    pub items: Vec<String>,
}

/// JSON shape of a finished batch
#[derive(Debug, Serialize)]
struct ReportOutput<'a> {
    direction: Direction,
    total: usize,
    succeeded: usize,
    failed: usize,
    bytes: u64,
    cancelled: bool,
    tasks: &'a [TransferTask],
}

pub async fn execute(args: TransferArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match run(&args, &formatter).await {
        Ok(code) => code,
        Err(e) => fail(&formatter, "Transfer failed", &e),
    }
}

async fn run(args: &TransferArgs, formatter: &Formatter) -> Result<ExitCode> {
    let (endpoints, direction) = match &args.command {
        TransferCommands::S3ToOnedrive(a) => (&a.endpoints, Direction::S3ToOneDrive),
        TransferCommands::OnedriveToS3(a) => (&a.endpoints, Direction::OneDriveToS3),
    };
    let filter = KeyFilter::new(endpoints.include.as_deref())?;

    let config = load_config()?;
    let bucket = endpoints
        .bucket
        .clone()
        .or_else(|| config.s3.bucket.clone())
        .ok_or_else(|| Error::InvalidBatch("no S3 bucket selected".into()))?;

    let mut session = SessionContext::new();
    session
        .select_bucket(&bucket)
        .select_drive(&endpoints.drive)
        .select_folder(&endpoints.folder)
        .select_prefix(&endpoints.prefix);

    let objects = object_store(&config).await?;
    let drives = drive_store(&config, args.auth, formatter).await?;
    let listing = ListingService::new()
        .with_object_store(objects.clone())
        .with_drive_store(drives.clone());

    let tasks = match &args.command {
        TransferCommands::S3ToOnedrive(a) => {
            let listed = if filter.is_set() {
                listing.list_objects(&bucket, &endpoints.prefix).await?
            } else {
                Vec::new()
            };
            let keys = select_keys(&a.keys, &listed, &filter);
            session.select_s3_to_onedrive(&keys)?
        }
        TransferCommands::OnedriveToS3(a) => {
            let files = listing
                .list_files(&endpoints.drive, &endpoints.folder)
                .await?;
            let selected = select_files(&files, &a.items, &filter, &endpoints.folder)?;
            session.select_onedrive_to_s3(&selected)?
        }
    };

    let report = run_tasks(&mut session, tasks, objects, drives, formatter).await?;
    print_report(formatter, direction, &report);
    Ok(ExitCode::from_report(&report))
}

/// Explicit keys first, then listed keys matching the filter, without repeats
fn select_keys(explicit: &[String], listed: &[RemoteEntity], filter: &KeyFilter) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    let matched = listed
        .iter()
        .filter(|_| filter.is_set())
        .filter(|o| filter.matches(&o.id))
        .map(|o| &o.id);

    for key in explicit.iter().chain(matched) {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    keys
}

/// Files named by id or matching the filter, in folder order
///
/// An id that is not a file in the folder is an error rather than a silent
/// skip.
fn select_files(
    files: &[RemoteEntity],
    ids: &[String],
    filter: &KeyFilter,
    folder: &str,
) -> Result<Vec<RemoteEntity>> {
    if let Some(missing) = ids.iter().find(|id| !files.iter().any(|f| &f.id == *id)) {
        return Err(Error::NotFound(format!(
            "item {missing} is not a file in folder {folder}"
        )));
    }

    Ok(files
        .iter()
        .filter(|f| ids.contains(&f.id) || (filter.is_set() && filter.matches(&f.name)))
        .cloned()
        .collect())
}

async fn run_tasks(
    session: &mut SessionContext,
    tasks: Vec<TransferTask>,
    objects: Arc<dyn ObjectStore>,
    drives: Arc<dyn DriveStore>,
    formatter: &Formatter,
) -> Result<TransferReport> {
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after the current item");
                cancel.cancel();
            }
        }
    });

    let orchestrator =
        TransferOrchestrator::new(TransferExecutor::new(objects, drives)).with_cancellation(cancel);

    let bar = ProgressBar::new(formatter.config(), tasks.len() as u64);
    session.begin_batch();
    let result = orchestrator
        .run_batch(session, tasks, |progress| {
            bar.set_position(progress.completed as u64);
            bar.set_message(&progress.item);
            if progress.status == TaskStatus::Failed {
                bar.println(&format!("failed: {}", progress.item));
            }
        })
        .await;
    bar.finish_and_clear();
    watcher.abort();

    let report = result?;
    session.record_report(report.clone());
    Ok(report)
}

fn print_report(formatter: &Formatter, direction: Direction, report: &TransferReport) {
    if formatter.is_json() {
        formatter.json(&ReportOutput {
            direction,
            total: report.total(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            bytes: report.bytes_transferred(),
            cancelled: report.cancelled,
            tasks: report.tasks(),
        });
        return;
    }

    formatter.println(&report_table(report, formatter.colors_enabled()).to_string());

    let size = humansize::format_size(report.bytes_transferred(), humansize::BINARY);
    let summary = format!(
        "{} of {} transferred ({size})",
        report.succeeded(),
        report.total()
    );
    if report.cancelled {
        formatter.warning(&format!("Cancelled: {summary}"));
    } else if report.failed() > 0 {
        formatter.warning(&format!("{} failed; {summary}", report.failed()));
    } else {
        formatter.success(&summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objects() -> Vec<RemoteEntity> {
        vec![
            RemoteEntity::object("reports/q1.csv", 10),
            RemoteEntity::object("reports/q1.pdf", 20),
            RemoteEntity::object("reports/q2.csv", 30),
        ]
    }

    fn files() -> Vec<RemoteEntity> {
        vec![
            RemoteEntity::file("01A", "a.txt", 1),
            RemoteEntity::file("01B", "b.csv", 2),
            RemoteEntity::file("01C", "c.csv", 3),
        ]
    }

    #[test]
    fn test_select_keys_explicit_only() {
        let filter = KeyFilter::default();
        let keys = select_keys(&["x.txt".to_string()], &objects(), &filter);
        assert_eq!(keys, vec!["x.txt"]);
    }

    #[test]
    fn test_select_keys_merges_and_dedupes() {
        let filter = KeyFilter::new(Some("*.csv")).unwrap();
        let explicit = vec!["reports/q2.csv".to_string(), "notes.md".to_string()];
        let keys = select_keys(&explicit, &objects(), &filter);
        assert_eq!(keys, vec!["reports/q2.csv", "notes.md", "reports/q1.csv"]);
    }

    #[test]
    fn test_select_files_by_id_keeps_folder_order() {
        let ids = vec!["01C".to_string(), "01A".to_string()];
        let selected = select_files(&files(), &ids, &KeyFilter::default(), "root").unwrap();
        let names: Vec<_> = selected.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "c.csv"]);
    }

    #[test]
    fn test_select_files_by_pattern() {
        let filter = KeyFilter::new(Some("*.csv")).unwrap();
        let selected = select_files(&files(), &[], &filter, "root").unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_files_unknown_id() {
        let ids = vec!["01Z".to_string()];
        let err = select_files(&files(), &ids, &KeyFilter::default(), "root").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("01Z")));
    }

    #[test]
    fn test_select_nothing_yields_empty() {
        assert!(select_keys(&[], &objects(), &KeyFilter::default()).is_empty());
        assert!(
            select_files(&files(), &[], &KeyFilter::default(), "root")
                .unwrap()
                .is_empty()
        );
    }
}
