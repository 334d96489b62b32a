//! Session context
//!
//! Holds the selections a user has made (bucket, drive, folder, prefix) and
//! the report of the last batch. It is passed explicitly to whatever drives a
//! batch instead of living in global state.

use crate::error::{Error, Result};
use crate::path::{ItemRef, destination_name, join_key};
use crate::task::{TransferReport, TransferTask};
use crate::traits::{EntityKind, RemoteEntity};

/// In-memory selections for one session
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    bucket: Option<String>,
    drive: Option<String>,
    folder: Option<String>,
    prefix: String,
    last_report: Option<TransferReport>,
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    (!value.trim().is_empty()).then_some(value)
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_bucket(&mut self, bucket: impl Into<String>) -> &mut Self {
        self.bucket = non_empty(bucket);
        self
    }

    pub fn select_drive(&mut self, drive_id: impl Into<String>) -> &mut Self {
        self.drive = non_empty(drive_id);
        self
    }

    /// OneDrive folder: the destination for S3→OneDrive, the source for OneDrive→S3
    pub fn select_folder(&mut self, folder_id: impl Into<String>) -> &mut Self {
        self.folder = non_empty(folder_id);
        self
    }

    /// Key prefix for objects written to S3
    pub fn select_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    pub fn drive(&self) -> Option<&str> {
        self.drive.as_deref()
    }

    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Report of the most recent batch, if one has run
    pub fn last_report(&self) -> Option<&TransferReport> {
        self.last_report.as_ref()
    }

    /// Drop the previous batch's report before a new batch starts
    pub fn begin_batch(&mut self) {
        self.last_report = None;
    }

    pub fn record_report(&mut self, report: TransferReport) {
        self.last_report = Some(report);
    }

    /// Bucket, drive and folder, or `InvalidBatch` naming the first missing one
    pub fn require_selections(&self) -> Result<(&str, &str, &str)> {
        let bucket = self
            .bucket()
            .ok_or_else(|| Error::InvalidBatch("no S3 bucket selected".into()))?;
        let drive = self
            .drive()
            .ok_or_else(|| Error::InvalidBatch("no OneDrive drive selected".into()))?;
        let folder = self
            .folder()
            .ok_or_else(|| Error::InvalidBatch("no OneDrive folder selected".into()))?;
        Ok((bucket, drive, folder))
    }

    /// Pair selected S3 keys with destinations in the selected OneDrive folder
    pub fn select_s3_to_onedrive<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<TransferTask>> {
        let (bucket, drive, folder) = self.require_selections()?;
        keys.iter()
            .map(|key| {
                let key = key.as_ref();
                let name = destination_name(key)?;
                Ok(TransferTask::new(
                    ItemRef::s3(bucket, key),
                    ItemRef::onedrive(drive, folder, name),
                ))
            })
            .collect()
    }

    /// Pair selected OneDrive files with keys under the selected prefix
    ///
    /// Anything other than a file (folders, notebooks, shortcuts) is
    /// rejected with [`Error::InvalidPath`].
    pub fn select_onedrive_to_s3(&self, files: &[RemoteEntity]) -> Result<Vec<TransferTask>> {
        let (bucket, drive, _) = self.require_selections()?;
        files
            .iter()
            .map(|file| {
                if file.kind != EntityKind::File {
                    return Err(Error::InvalidPath(format!(
                        "'{}' is not a file and cannot be transferred",
                        file.name
                    )));
                }
                let name = destination_name(&file.name)?;
                let key = join_key(&self.prefix, &name);
                Ok(TransferTask::new(
                    ItemRef::onedrive(drive, &file.id, &name),
                    ItemRef::s3(bucket, key),
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ROOT_FOLDER;

    fn full_context() -> SessionContext {
        let mut ctx = SessionContext::new();
        ctx.select_bucket("reports")
            .select_drive("drive-1")
            .select_folder(ROOT_FOLDER);
        ctx
    }

    #[test]
    fn test_require_selections_names_missing() {
        let mut ctx = SessionContext::new();
        ctx.select_drive("d").select_folder("f");
        let err = ctx.require_selections().unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(ref s) if s.contains("bucket")));

        let mut ctx = full_context();
        ctx.select_folder("  ");
        let err = ctx.require_selections().unwrap_err();
        assert!(matches!(err, Error::InvalidBatch(ref s) if s.contains("folder")));
    }

    #[test]
    fn test_select_s3_to_onedrive_uses_base_name() {
        let ctx = full_context();
        let tasks = ctx
            .select_s3_to_onedrive(&["reports/2024/summary.csv", "top.txt"])
            .unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(
            tasks[0].destination,
            ItemRef::onedrive("drive-1", "root", "summary.csv")
        );
        assert_eq!(tasks[1].source, ItemRef::s3("reports", "top.txt"));
    }

    #[test]
    fn test_select_rejects_folder_key() {
        let ctx = full_context();
        assert!(ctx.select_s3_to_onedrive(&["reports/"]).is_err());
    }

    #[test]
    fn test_select_onedrive_to_s3_applies_prefix() {
        let mut ctx = full_context();
        ctx.select_prefix("inbox/");
        let files = vec![RemoteEntity::file("id-7", "notes.txt", 3)];
        let tasks = ctx.select_onedrive_to_s3(&files).unwrap();

        assert_eq!(tasks[0].source, ItemRef::onedrive("drive-1", "id-7", "notes.txt"));
        assert_eq!(tasks[0].destination, ItemRef::s3("reports", "inbox/notes.txt"));
    }

    #[test]
    fn test_select_onedrive_to_s3_rejects_non_files() {
        let ctx = full_context();
        for entity in [
            RemoteEntity::folder("f-1", "Photos"),
            RemoteEntity::item("n-1", "Notebook"),
        ] {
            let files = vec![RemoteEntity::file("id-7", "notes.txt", 3), entity];
            let err = ctx.select_onedrive_to_s3(&files).unwrap_err();
            assert!(matches!(err, Error::InvalidPath(_)), "{err}");
        }
    }

    #[test]
    fn test_begin_batch_discards_report() {
        let mut ctx = full_context();
        ctx.record_report(TransferReport::new());
        assert!(ctx.last_report().is_some());
        ctx.begin_batch();
        assert!(ctx.last_report().is_none());
    }
}
