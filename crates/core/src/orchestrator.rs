//! Transfer orchestrator
//!
//! Runs a batch of tasks one at a time, in order. A failed task is recorded
//! and the batch moves on; only an invalid batch is refused outright.

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::session::SessionContext;
use crate::task::{TaskStatus, TransferReport, TransferTask};
use crate::transfer::TransferExecutor;

/// Progress emitted after each finished task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,

    /// Source of the task that just finished
    pub item: String,
    pub status: TaskStatus,
}

/// Drives a batch of [`TransferTask`]s through a [`TransferExecutor`]
pub struct TransferOrchestrator {
    executor: TransferExecutor,
    cancel: CancellationToken,
}

impl TransferOrchestrator {
    pub fn new(executor: TransferExecutor) -> Self {
        Self {
            executor,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop starting new tasks once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run `tasks` sequentially and collect their outcomes
    ///
    /// Returns [`Error::InvalidBatch`] without calling the executor when the
    /// context lacks a bucket, drive or folder, when there is nothing to do,
    /// or when a task has already been run.
    pub async fn run_batch<F>(
        &self,
        context: &SessionContext,
        tasks: Vec<TransferTask>,
        mut on_progress: F,
    ) -> Result<TransferReport>
    where
        F: FnMut(&BatchProgress),
    {
        context.require_selections()?;
        if tasks.is_empty() {
            return Err(Error::InvalidBatch("no items selected for transfer".into()));
        }
        if let Some(task) = tasks.iter().find(|t| t.status() != TaskStatus::Pending) {
            return Err(Error::InvalidBatch(format!(
                "task {} is {}, only pending tasks can be run",
                task.source,
                task.status()
            )));
        }

        let total = tasks.len();
        let span = tracing::info_span!("batch", total);
        let mut report = TransferReport::new();

        async {
            for (index, mut task) in tasks.into_iter().enumerate() {
                if self.cancel.is_cancelled() {
                    tracing::warn!(remaining = total - index, "batch cancelled");
                    report.cancelled = true;
                    break;
                }

                task.start()?;
                match self.executor.transfer(&task.source, &task.destination).await {
                    Ok(bytes) => {
                        tracing::info!(source = %task.source, bytes, "transferred");
                        task.succeed(bytes)?;
                    }
                    Err(e) => {
                        tracing::warn!(source = %task.source, error = %e, "transfer failed");
                        task.fail(e.reason())?;
                    }
                }

                let progress = BatchProgress {
                    completed: index + 1,
                    total,
                    item: task.source.to_string(),
                    status: task.status(),
                };
                report.push(task);
                on_progress(&progress);
            }
            Ok::<_, Error>(())
        }
        .instrument(span)
        .await?;

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            total,
            "batch finished"
        );
        Ok(report)
    }
}
