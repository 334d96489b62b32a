//! cx-onedrive: Microsoft Graph adapter for cloudxfer
//!
//! Implements the `DriveStore` trait over the Graph REST API and issues
//! bearer tokens through the OAuth device-code and client-credential
//! flows. This is the only crate that talks to Microsoft endpoints.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{DeviceCodeInfo, OAuthClient, authenticate};
pub use client::GraphClient;
pub use error::GraphError;
