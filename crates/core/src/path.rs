//! Item references and key/name handling
//!
//! An [`ItemRef`] names one side of a transfer: an S3 object or a OneDrive
//! item. Destination file names are always derived from the source's base
//! name.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator used by both S3 keys and OneDrive paths
pub const SEPARATOR: char = '/';

/// OneDrive folder id that addresses the root of a drive
pub const ROOT_FOLDER: &str = "root";

/// Reference to a transferable item on either cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ItemRef {
    /// An S3 object
    S3 { bucket: String, key: String },

    /// A OneDrive item.
    ///
    /// As a source, `item_id` is the file's own id. As a destination,
    /// `item_id` is the parent folder and `name` the file to create.
    #[serde(rename = "onedrive")]
    OneDrive {
        drive_id: String,
        item_id: String,
        name: String,
    },
}

impl ItemRef {
    /// Create an S3 reference
    pub fn s3(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        ItemRef::S3 {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Create a OneDrive reference
    pub fn onedrive(
        drive_id: impl Into<String>,
        item_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ItemRef::OneDrive {
            drive_id: drive_id.into(),
            item_id: item_id.into(),
            name: name.into(),
        }
    }

    /// File name of the referenced item
    pub fn file_name(&self) -> &str {
        match self {
            ItemRef::S3 { key, .. } => base_name(key),
            ItemRef::OneDrive { name, .. } => base_name(name),
        }
    }

    pub fn is_s3(&self) -> bool {
        matches!(self, ItemRef::S3 { .. })
    }

    pub fn is_onedrive(&self) -> bool {
        matches!(self, ItemRef::OneDrive { .. })
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemRef::S3 { bucket, key } => write!(f, "s3://{bucket}/{key}"),
            ItemRef::OneDrive {
                drive_id,
                item_id,
                name,
            } => write!(f, "onedrive://{drive_id}/{item_id}/{name}"),
        }
    }
}

/// Direction of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    S3ToOneDrive,
    OneDriveToS3,
}

impl Direction {
    /// Determine the direction of a source/destination pair
    ///
    /// Returns `None` for same-provider pairs, which are not supported.
    pub fn of(source: &ItemRef, destination: &ItemRef) -> Option<Self> {
        match (source, destination) {
            (ItemRef::S3 { .. }, ItemRef::OneDrive { .. }) => Some(Direction::S3ToOneDrive),
            (ItemRef::OneDrive { .. }, ItemRef::S3 { .. }) => Some(Direction::OneDriveToS3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::S3ToOneDrive => write!(f, "s3-to-onedrive"),
            Direction::OneDriveToS3 => write!(f, "onedrive-to-s3"),
        }
    }
}

/// Return the component after the last separator
///
/// `"reports/2024/summary.csv"` becomes `"summary.csv"`. A path ending in a
/// separator has an empty base name.
pub fn base_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Whether a key is an S3 folder marker (ends with the separator)
pub fn is_folder_marker(key: &str) -> bool {
    key.ends_with(SEPARATOR)
}

/// Join an optional S3 prefix and a file name into an object key
pub fn join_key(prefix: &str, name: &str) -> String {
    let base = prefix.trim_end_matches(SEPARATOR);
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}{SEPARATOR}{name}")
    }
}

/// Derive a destination file name from a source path, rejecting empty names
pub fn destination_name(source: &str) -> Result<String> {
    let name = base_name(source);
    if name.is_empty() {
        return Err(Error::InvalidPath(format!(
            "'{source}' has no file name to transfer"
        )));
    }
    Ok(name.to_string())
}
