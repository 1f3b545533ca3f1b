//! Bounded-parallel batch orchestration
//!
//! A [`BatchRunner`] fans the rows of a manifest out to a pool of at most
//! `jobs` concurrent workers, collects one record per row and hands them
//! back in manifest order whatever order the workers finished in. A failing
//! or panicking row never stops the batch.

pub mod manifest;
pub mod report;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::domain::model::*;
use crate::utils::Utils;

pub use manifest::{HeaderMode, ManifestReader};
pub use report::{ReportFormat, ReportWriter};

/// Failure message recorded for rows never started because of cancellation
pub const CANCELLED_MESSAGE: &str = "cancelled";
/// Failure message recorded for rows whose identifier column is empty
pub const EMPTY_IDENTIFIER_MESSAGE: &str = "empty identifier";

/// Work applied to every manifest row
#[async_trait]
pub trait BatchTask: Send + Sync + 'static {
    /// Per-row record written to the report
    type Record: Outcome + Serialize + Send + 'static;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Process one row; failures are expressed in the record
    async fn process(&self, row: &ManifestRow) -> Self::Record;

    /// Record for a row that could not be processed at all
    fn failure(&self, row: &ManifestRow, reason: &str) -> Self::Record;
}

/// Shared cancellation flag
///
/// Cancelling stops the dispatch of new rows; rows already running finish.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Summary of one finished run, logged at the end of every batch
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub task: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn new<T: Outcome>(task: &str, started_at: DateTime<Utc>, report: &Report<T>) -> Self {
        Self {
            task: task.to_string(),
            started_at,
            finished_at: Utc::now(),
            total: report.records.len(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            cancelled: report.cancelled,
        }
    }
}

/// Worker pool running a [`BatchTask`] over manifest rows
pub struct BatchRunner {
    jobs: usize,
    cancel: CancelHandle,
    span: Span,
}

impl BatchRunner {
    /// Create a runner with `jobs` workers; zero is treated as one
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs: jobs.max(1),
            cancel: CancelHandle::new(),
            span: Span::none(),
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Parent span for every worker
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run `task` over `rows`
    ///
    /// The returned report holds exactly one record per row, in row order.
    pub async fn run<T: BatchTask>(&self, task: Arc<T>, rows: Vec<ManifestRow>) -> Report<T::Record> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let total = rows.len();
        let rows = Arc::new(rows);
        info!(
            parent: &self.span,
            task = task.name(),
            rows = total,
            jobs = self.jobs,
            "Starting batch"
        );

        let semaphore = Arc::new(Semaphore::new(self.jobs));
        let mut cancelled_rx = self.cancel.subscribe();
        let mut workers = JoinSet::new();
        let mut slots: Vec<Option<T::Record>> = (0..total).map(|_| None).collect();
        let mut cancelled = false;

        for position in 0..total {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if rows[position].identifier.is_empty() {
                warn!(parent: &self.span, index = position, "Row without identifier");
                slots[position] = Some(task.failure(&rows[position], EMPTY_IDENTIFIER_MESSAGE));
                continue;
            }
            let permit = tokio::select! {
                biased;
                _ = cancelled_rx.wait_for(|c| *c) => {
                    cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let row_span = info_span!(
                parent: &self.span,
                "row",
                index = position,
                identifier = %rows[position].identifier
            );
            let task = Arc::clone(&task);
            let rows = Arc::clone(&rows);
            workers.spawn(
                async move {
                    let _permit = permit;
                    let worker_task = Arc::clone(&task);
                    let worker_rows = Arc::clone(&rows);
                    let joined = tokio::spawn(
                        async move { worker_task.process(&worker_rows[position]).await }
                            .in_current_span(),
                    )
                    .await;
                    let record = match joined {
                        Ok(record) => record,
                        Err(e) => {
                            error!("Worker crashed: {}", e);
                            task.failure(&rows[position], &format!("worker crashed: {}", e))
                        }
                    };
                    (position, record)
                }
                .instrument(row_span),
            );

            while let Some(finished) = workers.try_join_next() {
                store(&mut slots, finished, total);
            }
        }

        while let Some(finished) = workers.join_next().await {
            store(&mut slots, finished, total);
        }

        if cancelled {
            warn!(parent: &self.span, "Batch cancelled, remaining rows were not started");
        }
        let records = slots
            .into_iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.unwrap_or_else(|| task.failure(&rows[position], CANCELLED_MESSAGE))
            })
            .collect();
        let report = Report { records, cancelled };

        let summary = RunSummary::new(task.name(), started_at, &report);
        info!(
            parent: &self.span,
            task = %summary.task,
            started_at = %summary.started_at.to_rfc3339(),
            finished_at = %summary.finished_at.to_rfc3339(),
            elapsed = %Utils::format_duration(timer.elapsed()),
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Batch finished"
        );
        report
    }
}

fn store<R>(
    slots: &mut [Option<R>],
    finished: Result<(usize, R), tokio::task::JoinError>,
    total: usize,
) {
    match finished {
        Ok((position, record)) => {
            slots[position] = Some(record);
            let done = slots.iter().filter(|s| s.is_some()).count();
            let progress = Utils::calculate_progress(done as u64, total as u64);
            debug!(done, total, progress = %format!("{:.1}%", progress), "Row finished");
        }
        Err(e) => error!("Batch worker lost: {}", e),
    }
}
