//! rclone gateway
//!
//! Turns rclone's exit codes and stdout into typed results. No retries and
//! no rate limiting: one call, one process.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::invoker::{CommandInvoker, ToolInvoker, ToolOutput};

type Result<T> = std::result::Result<T, GatewayError>;

/// One entry of `rclone lsjson`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileEntry {
    pub path: String,
    pub name: String,

    #[serde(default)]
    pub size: i64,

    #[serde(default)]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub mod_time: Option<String>,

    #[serde(default)]
    pub is_dir: bool,

    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Fields rclone adds that are not modelled above
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Outcome of a successful copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub message: String,
    pub details: String,
}

/// `remote:path`, or `remote:` when the path is empty
fn remote_spec(remote: &str, path: &str) -> String {
    format!("{remote}:{path}")
}

/// `remote:path` with a trailing `:` removed, as passed to `rclone copy`
fn copy_spec(remote: &str, path: &str) -> String {
    remote_spec(remote, path).trim_end_matches(':').to_string()
}

fn check(output: ToolOutput) -> Result<ToolOutput> {
    if output.success() {
        Ok(output)
    } else {
        Err(GatewayError::Tool(output.stderr.trim().to_string()))
    }
}

/// Typed access to rclone
#[derive(Clone)]
pub struct RcloneGateway {
    invoker: Arc<dyn ToolInvoker>,
}

impl RcloneGateway {
    pub fn new(invoker: Arc<dyn ToolInvoker>) -> Self {
        Self { invoker }
    }

    /// Gateway over the rclone binary at `binary`
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self::new(Arc::new(CommandInvoker::new(binary)))
    }

    async fn run(&self, args: Vec<String>) -> Result<ToolOutput> {
        let output = self.invoker.run(&args).await?;
        if !output.success() {
            tracing::warn!(?args, code = ?output.code, "rclone failed");
        }
        check(output)
    }

    /// Names of configured remotes, without the trailing `:`
    pub async fn list_remotes(&self) -> Result<Vec<String>> {
        let output = self.run(vec!["listremotes".to_string()]).await?;
        Ok(output
            .stdout
            .lines()
            .map(|line| line.trim().trim_end_matches(':').to_string())
            .filter(|name| !name.is_empty())
            .collect())
    }

    /// Entries under `remote:path`
    pub async fn list_path(&self, remote: &str, path: &str) -> Result<Vec<FileEntry>> {
        let output = self
            .run(vec!["lsjson".to_string(), remote_spec(remote, path)])
            .await?;
        serde_json::from_str(&output.stdout).map_err(|e| {
            tracing::debug!(error = %e, "lsjson output did not parse");
            GatewayError::decode()
        })
    }

    /// Copy `src_remote:src_path` to `dest_remote:dest_path`
    pub async fn copy(
        &self,
        src_remote: &str,
        src_path: &str,
        dest_remote: &str,
        dest_path: &str,
    ) -> Result<TransferSummary> {
        let src = copy_spec(src_remote, src_path);
        let dest = copy_spec(dest_remote, dest_path);
        tracing::info!(%src, %dest, "rclone copy");

        let output = self
            .run(vec![
                "copy".to_string(),
                src,
                dest,
                "--progress".to_string(),
            ])
            .await?;

        Ok(TransferSummary {
            message: "Transfer successful".to_string(),
            details: output.stdout,
        })
    }
}
