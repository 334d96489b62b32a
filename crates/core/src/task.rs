//! Transfer tasks and batch reports

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::{Direction, ItemRef};

/// Lifecycle of a transfer task
///
/// Moves only forward: Pending → InProgress → {Success, Failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Success => "Success",
            TaskStatus::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// One source/destination pair selected for transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTask {
    pub source: ItemRef,
    pub destination: ItemRef,
    status: TaskStatus,

    /// Failure reason or success note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Bytes written to the destination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

impl TransferTask {
    pub fn new(source: ItemRef, destination: ItemRef) -> Self {
        Self {
            source,
            destination,
            status: TaskStatus::Pending,
            detail: None,
            bytes: None,
        }
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::of(&self.source, &self.destination)
    }

    /// Pending → InProgress
    pub fn start(&mut self) -> Result<()> {
        self.advance(TaskStatus::Pending, TaskStatus::InProgress)
    }

    /// InProgress → Success
    pub fn succeed(&mut self, bytes: u64) -> Result<()> {
        self.advance(TaskStatus::InProgress, TaskStatus::Success)?;
        self.bytes = Some(bytes);
        self.detail = Some("File transferred successfully".to_string());
        Ok(())
    }

    /// InProgress → Failed
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        self.advance(TaskStatus::InProgress, TaskStatus::Failed)?;
        self.detail = Some(reason.into());
        Ok(())
    }

    fn advance(&mut self, from: TaskStatus, to: TaskStatus) -> Result<()> {
        if self.status != from {
            return Err(Error::General(format!(
                "task {} cannot move from {} to {to}",
                self.source, self.status
            )));
        }
        self.status = to;
        Ok(())
    }
}

/// Outcomes of one batch, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    tasks: Vec<TransferTask>,

    /// Set when the batch stopped early on request
    pub cancelled: bool,
}

impl TransferReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished task
    pub fn push(&mut self, task: TransferTask) {
        debug_assert!(task.status().is_finished());
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[TransferTask] {
        &self.tasks
    }

    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && !self.cancelled
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.tasks.iter().filter_map(|t| t.bytes).sum()
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status() == status).count()
    }
}
