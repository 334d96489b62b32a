//! cx-core: Core library for the cx S3/OneDrive transfer tool
//!
//! This crate provides the provider-independent parts of cx:
//! - Configuration management
//! - Item references and destination naming
//! - `ObjectStore` and `DriveStore` traits for the two clouds
//! - Listing, single-item transfer and batch orchestration
//!
//! Nothing here depends on an SDK or HTTP client; the `cx-s3` and
//! `cx-onedrive` crates implement the store traits.

pub mod config;
pub mod credential;
pub mod error;
pub mod listing;
pub mod orchestrator;
pub mod path;
pub mod session;
pub mod task;
pub mod traits;
pub mod transfer;

pub use config::{Config, ConfigManager, Defaults, OneDriveSettings, RcloneSettings, S3Settings};
pub use credential::{AccessToken, AuthMode, Credential, S3Keys};
pub use error::{Error, Result};
pub use listing::{DriveListing, ListingService, S3Listing};
pub use orchestrator::{BatchProgress, TransferOrchestrator};
pub use path::{Direction, ItemRef, ROOT_FOLDER};
pub use session::SessionContext;
pub use task::{TaskStatus, TransferReport, TransferTask};
pub use traits::{
    ByteStream, DriveStore, EntityKind, ListOptions, ListPage, ObjectStore, ObjectStream,
    RemoteEntity,
};
pub use transfer::TransferExecutor;
