//! Tool invocation seam
//!
//! The gateway never spawns processes directly; it goes through
//! [`ToolInvoker`] so tests can substitute canned output.

use async_trait::async_trait;

/// Captured result of one tool run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs the external tool with the given arguments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn run(&self, args: &[String]) -> std::io::Result<ToolOutput>;
}

/// Invokes a binary through `tokio::process`
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    binary: String,
}

impl CommandInvoker {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for CommandInvoker {
    fn default() -> Self {
        Self::new("rclone")
    }
}

#[async_trait]
impl ToolInvoker for CommandInvoker {
    async fn run(&self, args: &[String]) -> std::io::Result<ToolOutput> {
        tracing::debug!(binary = %self.binary, ?args, "running tool");

        let output = tokio::process::Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
