//! Shared setup for commands: configuration, clients and error reporting

use std::sync::Arc;

use clap::ValueEnum;
use cx_core::{
    AuthMode, Config, ConfigManager, DriveStore, Error, ObjectStore, RemoteEntity, Result,
};
use cx_onedrive::{DeviceCodeInfo, GraphClient, authenticate};
use cx_s3::{MultipartConfig, S3Client};

use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar, entity_table};

/// How to sign in to OneDrive
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    /// Interactive device-code flow
    DeviceCode,
    /// App-only token from the configured client secret
    ClientCredential,
}

impl From<AuthArg> for AuthMode {
    fn from(arg: AuthArg) -> Self {
        match arg {
            AuthArg::DeviceCode => AuthMode::DeviceCode,
            AuthArg::ClientCredential => AuthMode::ClientCredential,
        }
    }
}

/// Client credential when a secret is configured, device code otherwise
pub fn default_auth_mode(config: &Config) -> AuthMode {
    let has_secret = config
        .onedrive
        .client_secret
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    if has_secret {
        AuthMode::ClientCredential
    } else {
        AuthMode::DeviceCode
    }
}

/// Load the config file with environment overrides applied
pub fn load_config() -> Result<Config> {
    ConfigManager::new()?.load_with_env()
}

/// S3 client from the configured static keys
pub async fn object_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    let credential = authenticate(AuthMode::StaticKeys, config, |_| {}).await?;
    let keys = credential
        .as_s3_keys()
        .ok_or_else(|| Error::Auth("expected S3 keys".into()))?;
    let multipart = MultipartConfig::new().part_size(config.s3.part_size);
    Ok(Arc::new(S3Client::new(keys, multipart).await?))
}

/// Sign in to OneDrive and build a Graph client
///
/// The device-code prompt is printed to stderr in every output mode.
pub async fn drive_store(
    config: &Config,
    auth: Option<AuthArg>,
    formatter: &Formatter,
) -> Result<Arc<dyn DriveStore>> {
    let mode = auth.map(AuthMode::from).unwrap_or_else(|| default_auth_mode(config));
    tracing::debug!(%mode, "signing in to OneDrive");

    let spinner = ProgressBar::spinner(formatter.config(), "Signing in to OneDrive...");
    let credential = authenticate(mode, config, |info: &DeviceCodeInfo| {
        spinner.println("");
        formatter.prompt(&device_code_prompt(info));
        spinner.set_message("Waiting for sign-in to complete...");
    })
    .await;
    spinner.finish_and_clear();

    let token = credential?
        .as_bearer()
        .cloned()
        .ok_or_else(|| Error::Auth("expected a bearer token".into()))?;
    let client = GraphClient::with_base_url(&token, &config.onedrive.graph_url)?;
    Ok(Arc::new(client))
}

fn device_code_prompt(info: &DeviceCodeInfo) -> String {
    info.message.clone().unwrap_or_else(|| {
        format!(
            "To sign in, open {} and enter the code {}",
            info.verification_uri, info.user_code
        )
    })
}

#[derive(Debug, Serialize)]
struct ListOutput<'a> {
    items: &'a [RemoteEntity],
    total: usize,
}

/// Print a listing as a table or as `{"items": [..], "total": n}`
pub fn print_entities(formatter: &Formatter, entities: &[RemoteEntity], show_ids: bool) {
    if formatter.is_json() {
        formatter.json(&ListOutput {
            items: entities,
            total: entities.len(),
        });
    } else if entities.is_empty() {
        formatter.println("(empty)");
    } else {
        formatter.println(&entity_table(entities, show_ids).to_string());
    }
}

/// Print `err` with `context` and map it to an exit code
pub fn fail(formatter: &Formatter, context: &str, err: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {}", err.reason()));
    ExitCode::from_error(err)
}
