//! Bounded worker pool for per-item remote operations.
//!
//! Items are started lazily, at most `concurrency` at a time. Once the
//! cancellation token fires no new item starts, in-flight items finish, and
//! the rest are reported as skipped. Every item's outcome is collected before
//! the batch returns.

use std::future::Future;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use staticpush_core::constants::{DEFAULT_OPERATION_TIMEOUT_SECONDS, DEFAULT_UPLOAD_CONCURRENCY};
use staticpush_storage::StorageResult;
use tokio_util::sync::CancellationToken;

use crate::progress::{Phase, ProgressSink};
use crate::retry::RetryPolicy;

/// One item that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub key: String,
    pub cause: String,
}

/// Outcome of one batch phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// Keys never started because the run was cancelled.
    pub skipped: Vec<String>,
    pub failures: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.key.as_str()).collect()
    }
}

enum Outcome {
    Succeeded,
    Failed(ItemFailure),
    Skipped(String),
}

/// Limits shared by the clearer and the uploader.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub concurrency: usize,
    /// Applied to each attempt of each remote call.
    pub operation_timeout: Duration,
    pub retry: RetryPolicy,
    pub cancel: CancellationToken,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECONDS),
            retry: RetryPolicy::none(),
            cancel: CancellationToken::new(),
        }
    }
}

impl WorkerOptions {
    /// Run one remote call under the per-attempt timeout and the retry policy.
    pub async fn call<T, F, Fut>(
        &self,
        operation: &'static str,
        key: &str,
        mut f: F,
    ) -> Result<T, String>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let timeout = self.operation_timeout;
        self.retry
            .run(operation, key, || {
                let attempt = f();
                async move {
                    match tokio::time::timeout(timeout, attempt).await {
                        Ok(result) => result.map_err(|e| e.to_string()),
                        Err(_) => Err(format!("{} timed out after {:?}", operation, timeout)),
                    }
                }
            })
            .await
    }
}

/// Run `task` over `items` on the bounded pool and collect every outcome.
///
/// `key_of` names an item for progress and failure reports.
pub async fn run_batch<T, K, F, Fut>(
    phase: Phase,
    items: Vec<T>,
    options: &WorkerOptions,
    progress: &dyn ProgressSink,
    key_of: K,
    task: F,
) -> BatchReport
where
    K: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    progress.phase_started(phase, items.len());

    let task = &task;
    let cancel = &options.cancel;

    let outcomes: Vec<Outcome> = stream::iter(items)
        .map(move |item| {
            let key = key_of(&item);
            // The cancellation check runs when the pool starts the item, not when it is queued.
            async move {
                if cancel.is_cancelled() {
                    return Outcome::Skipped(key);
                }
                match task(item).await {
                    Ok(()) => {
                        progress.tick(phase, &key);
                        Outcome::Succeeded
                    }
                    Err(cause) => {
                        tracing::error!(phase = %phase, key = %key, error = %cause, "Item failed");
                        progress.tick(phase, &key);
                        Outcome::Failed(ItemFailure { key, cause })
                    }
                }
            }
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Succeeded => {
                report.attempted += 1;
                report.succeeded += 1;
            }
            Outcome::Failed(failure) => {
                report.attempted += 1;
                report.failures.push(failure);
            }
            Outcome::Skipped(key) => report.skipped.push(key),
        }
    }
    report.failures.sort_by(|a, b| a.key.cmp(&b.key));
    report.skipped.sort();

    progress.phase_finished(phase);
    report
}
