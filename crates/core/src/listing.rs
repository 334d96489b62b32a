//! Remote listing service
//!
//! Enumerates buckets, objects, drives and folders. Every store error is
//! reported as [`Error::List`].

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::path::is_folder_marker;
use crate::traits::{DriveStore, EntityKind, ListOptions, ObjectStore, RemoteEntity};

/// Page size requested from S3
const PAGE_SIZE: i32 = 1000;

fn list_error(err: Error) -> Error {
    match err {
        Error::List(_) => err,
        other => Error::List(other.reason()),
    }
}

/// Listing over the S3 side
pub struct S3Listing {
    store: Arc<dyn ObjectStore>,
}

impl S3Listing {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Bucket names; empty when the account has none
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        let buckets = self.store.list_buckets().await.map_err(list_error)?;
        Ok(buckets.into_iter().map(|b| b.name).collect())
    }

    /// Every object under `prefix`, following continuation tokens to the end
    ///
    /// Folder markers are dropped; order is whatever the service returns.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<RemoteEntity>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let options = ListOptions {
                prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
                continuation_token: continuation_token.take(),
                max_keys: Some(PAGE_SIZE),
            };

            let page = self
                .store
                .list_objects_page(bucket, options)
                .await
                .map_err(list_error)?;
            pages += 1;

            objects.extend(
                page.items
                    .into_iter()
                    .filter(|item| !is_folder_marker(&item.id)),
            );

            if !page.truncated {
                break;
            }

            match page.continuation_token {
                Some(token) => continuation_token = Some(token),
                None => {
                    return Err(Error::List(format!(
                        "bucket {bucket} returned a truncated page without a continuation token"
                    )));
                }
            }
        }

        tracing::debug!(bucket, prefix, pages, count = objects.len(), "listed objects");
        Ok(objects)
    }
}

/// Listing over the OneDrive side
pub struct DriveListing {
    store: Arc<dyn DriveStore>,
}

impl DriveListing {
    pub fn new(store: Arc<dyn DriveStore>) -> Self {
        Self { store }
    }

    pub async fn list_root_children(&self) -> Result<Vec<RemoteEntity>> {
        self.store.list_root_children().await.map_err(list_error)
    }

    pub async fn list_drives(&self) -> Result<Vec<RemoteEntity>> {
        self.store.list_drives().await.map_err(list_error)
    }

    /// Sub-folders of `folder_id` (single page)
    pub async fn list_folders(&self, drive_id: &str, folder_id: &str) -> Result<Vec<RemoteEntity>> {
        self.children_of_kind(drive_id, folder_id, EntityKind::Folder)
            .await
    }

    /// Files directly inside `folder_id` (single page)
    pub async fn list_files(&self, drive_id: &str, folder_id: &str) -> Result<Vec<RemoteEntity>> {
        self.children_of_kind(drive_id, folder_id, EntityKind::File)
            .await
    }

    async fn children_of_kind(
        &self,
        drive_id: &str,
        folder_id: &str,
        kind: EntityKind,
    ) -> Result<Vec<RemoteEntity>> {
        let children = self
            .store
            .list_children(drive_id, folder_id)
            .await
            .map_err(list_error)?;
        Ok(children.into_iter().filter(|c| c.kind == kind).collect())
    }
}

/// Both listings behind one handle
///
/// Either side may be absent when its credentials were not supplied.
#[derive(Default)]
pub struct ListingService {
    s3: Option<S3Listing>,
    drive: Option<DriveListing>,
}

impl ListingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.s3 = Some(S3Listing::new(store));
        self
    }

    pub fn with_drive_store(mut self, store: Arc<dyn DriveStore>) -> Self {
        self.drive = Some(DriveListing::new(store));
        self
    }

    fn s3(&self) -> Result<&S3Listing> {
        self.s3
            .as_ref()
            .ok_or_else(|| Error::Config("S3 credentials are not configured".into()))
    }

    fn drive(&self) -> Result<&DriveListing> {
        self.drive
            .as_ref()
            .ok_or_else(|| Error::Config("OneDrive credentials are not configured".into()))
    }

    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        self.s3()?.list_buckets().await
    }

    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<RemoteEntity>> {
        self.s3()?.list_objects(bucket, prefix).await
    }

    pub async fn list_root_children(&self) -> Result<Vec<RemoteEntity>> {
        self.drive()?.list_root_children().await
    }

    pub async fn list_drives(&self) -> Result<Vec<RemoteEntity>> {
        self.drive()?.list_drives().await
    }

    pub async fn list_folders(&self, drive_id: &str, folder_id: &str) -> Result<Vec<RemoteEntity>> {
        self.drive()?.list_folders(drive_id, folder_id).await
    }

    pub async fn list_files(&self, drive_id: &str, folder_id: &str) -> Result<Vec<RemoteEntity>> {
        self.drive()?.list_files(drive_id, folder_id).await
    }
}
