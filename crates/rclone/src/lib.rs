//! cx-rclone: rclone gateway for cloudxfer
//!
//! Wraps the `rclone` executable behind the [`ToolInvoker`] trait and
//! exposes remote listing and copy both as a library and as a small
//! HTTP facade.

pub mod error;
pub mod gateway;
pub mod invoker;
pub mod server;

pub use error::GatewayError;
pub use gateway::{FileEntry, RcloneGateway, TransferSummary};
pub use invoker::{CommandInvoker, ToolInvoker, ToolOutput};
pub use server::{AppState, build_router, serve};
