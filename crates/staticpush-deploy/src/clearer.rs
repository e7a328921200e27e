use std::time::Instant;

use staticpush_storage::Storage;

use crate::batch::{run_batch, BatchReport, WorkerOptions};
use crate::error::DeployError;
use crate::progress::{Phase, ProgressSink};

/// Delete every object in the container.
///
/// The listing is fatal on failure. Deletes run on the worker pool and every
/// one is attempted; any failure yields `ClearFailed` with the full report.
pub async fn clear_container(
    storage: &dyn Storage,
    options: &WorkerOptions,
    progress: &dyn ProgressSink,
) -> Result<BatchReport, DeployError> {
    let start = Instant::now();

    let objects = tokio::time::timeout(options.operation_timeout, storage.list())
        .await
        .map_err(|_| DeployError::Timeout {
            operation: "list",
            after: options.operation_timeout,
        })??;

    tracing::info!(
        container = %storage.container(),
        object_count = objects.len(),
        "Clearing container"
    );

    let report = run_batch(
        Phase::ClearContainer,
        objects,
        options,
        progress,
        |object| object.key.clone(),
        |object| async move {
            options
                .call("delete", &object.key, || storage.delete(&object.key))
                .await
        },
    )
    .await;

    if !report.failures.is_empty() {
        return Err(DeployError::ClearFailed(Box::new(report)));
    }
    if !report.skipped.is_empty() {
        return Err(DeployError::Cancelled(Box::new(report)));
    }

    tracing::info!(
        container = %storage.container(),
        deleted = report.succeeded,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Container cleared"
    );
    progress.info(&format!("Container {} is empty", storage.container()));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingProgress;
    use bytes::Bytes;
    use staticpush_core::ObjectProperties;
    use staticpush_storage::MemoryStorage;

    #[tokio::test]
    async fn removes_every_object() {
        let storage = MemoryStorage::new("site");
        for key in ["a.html", "css/b.css", "deep/nested/c.js"] {
            storage
                .put(key, Bytes::from_static(b"x"), &ObjectProperties::default())
                .await
                .unwrap();
        }
        let progress = RecordingProgress::new();

        let report = clear_container(&storage, &WorkerOptions::default(), &progress)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 3);
        assert!(storage.keys().await.unwrap().is_empty());
        assert_eq!(progress.ticks(Phase::ClearContainer), 3);
    }

    #[tokio::test]
    async fn empty_container_is_fine() {
        let storage = MemoryStorage::new("site");
        let report = clear_container(
            &storage,
            &WorkerOptions::default(),
            &RecordingProgress::new(),
        )
        .await
        .unwrap();
        assert_eq!(report.attempted, 0);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let storage = MemoryStorage::new("site");
        storage
            .put("a", Bytes::from_static(b"x"), &ObjectProperties::default())
            .await
            .unwrap();
        let options = WorkerOptions::default();
        options.cancel.cancel();

        let result = clear_container(&storage, &options, &RecordingProgress::new()).await;

        match result {
            Err(DeployError::Cancelled(report)) => assert_eq!(report.skipped, vec!["a"]),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(storage.keys().await.unwrap(), vec!["a"]);
    }
}
