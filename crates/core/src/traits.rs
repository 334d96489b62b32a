//! Store trait definitions
//!
//! [`ObjectStore`] covers the S3 side and [`DriveStore`] the OneDrive side.
//! The listing service and the transfer executor only talk to these traits,
//! so they can be driven by in-memory fakes in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kind of a listable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Bucket,
    Object,
    Drive,
    Folder,
    File,

    /// Drive item with neither a file nor a folder facet (OneNote notebook, shortcut)
    Item,
}

/// A listable unit on either cloud
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntity {
    pub kind: EntityKind,

    /// Bucket name, object key, or OneDrive item/drive id
    pub id: String,

    /// Display name
    pub name: String,

    /// Size in bytes (None for buckets, drives and folders)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,
}

impl RemoteEntity {
    fn new(kind: EntityKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
        }
    }

    pub fn bucket(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(EntityKind::Bucket, name.clone(), name)
    }

    /// An S3 object; `id` and `name` are both the full key
    pub fn object(key: impl Into<String>, size: u64) -> Self {
        let key = key.into();
        Self::new(EntityKind::Object, key.clone(), key).with_size(size)
    }

    pub fn drive(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Drive, id, name)
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Folder, id, name)
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>, size: u64) -> Self {
        Self::new(EntityKind::File, id, name).with_size(size)
    }

    pub fn item(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(EntityKind::Item, id, name)
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size_bytes = Some(size);
        self.size_human = Some(humansize::format_size(size, humansize::BINARY));
        self
    }

    pub fn with_last_modified(mut self, ts: Option<jiff::Timestamp>) -> Self {
        self.last_modified = ts;
        self
    }
}

/// Options for a single object listing request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,

    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,
}

/// One page of an object listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub items: Vec<RemoteEntity>,

    /// Whether more pages are available
    pub truncated: bool,

    /// Token for the next page
    pub continuation_token: Option<String>,
}

/// Stream of body chunks
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// An object body in flight between two stores
pub struct ObjectStream {
    /// Total length when the source reports it
    pub content_length: Option<u64>,

    /// MIME type when known
    pub content_type: Option<String>,

    pub body: ByteStream,
}

impl ObjectStream {
    pub fn new(body: ByteStream, content_length: Option<u64>) -> Self {
        Self {
            content_length,
            content_type: None,
            body,
        }
    }

    /// Wrap an in-memory buffer
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data: Bytes = data.into();
        let len = data.len() as u64;
        let body = if data.is_empty() {
            futures::stream::empty().boxed()
        } else {
            futures::stream::once(async move { Ok(data) }).boxed()
        };
        Self::new(body, Some(len))
    }

    pub fn with_content_type(mut self, content_type: Option<String>) -> Self {
        self.content_type = content_type;
        self
    }

    /// Drain the stream into memory
    pub async fn collect(self) -> Result<Vec<u8>> {
        self.body
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
    }
}

impl std::fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStream")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// S3-compatible storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<RemoteEntity>>;

    /// List one page of objects in a bucket
    async fn list_objects_page(&self, bucket: &str, options: ListOptions) -> Result<ListPage>;

    /// Open an object for streaming reads
    async fn get_object_stream(&self, bucket: &str, key: &str) -> Result<ObjectStream>;

    /// Upload a stream to an object, returning the number of bytes written
    async fn put_object_stream(&self, bucket: &str, key: &str, stream: ObjectStream)
    -> Result<u64>;
}

/// OneDrive storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Children of the default drive's root
    async fn list_root_children(&self) -> Result<Vec<RemoteEntity>>;

    /// Drives available to the signed-in identity
    async fn list_drives(&self) -> Result<Vec<RemoteEntity>>;

    /// Children (files and folders) of a folder
    async fn list_children(&self, drive_id: &str, folder_id: &str) -> Result<Vec<RemoteEntity>>;

    /// Open an item's content for streaming reads
    async fn download(&self, drive_id: &str, item_id: &str) -> Result<ObjectStream>;

    /// Upload a stream as `name` inside `folder_id`
    async fn upload(
        &self,
        drive_id: &str,
        folder_id: &str,
        name: &str,
        stream: ObjectStream,
    ) -> Result<RemoteEntity>;
}
