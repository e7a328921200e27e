use std::path::PathBuf;
use std::time::Duration;

use staticpush_storage::StorageError;
use thiserror::Error;

use crate::batch::BatchReport;

/// Errors that stop a deploy.
///
/// Local filesystem problems fail fast. Remote per-item failures are
/// collected first and surface as `ClearFailed` / `UploadFailed` once the
/// whole batch was attempted.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not valid UTF-8 or not under the source root: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Clearing the container failed for {} of {} objects", .0.failures.len(), .0.attempted)]
    ClearFailed(Box<BatchReport>),

    #[error("Upload failed for {} of {} files", .0.failures.len(), .0.attempted)]
    UploadFailed(Box<BatchReport>),

    /// The report lists the keys that were never started. It is empty when
    /// cancellation was noticed between phases.
    #[error("Deploy cancelled with {} items not started", .0.skipped.len())]
    Cancelled(Box<BatchReport>),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeployError {
    /// The per-item report carried by batch failures and cancellation.
    pub fn batch_report(&self) -> Option<&BatchReport> {
        match self {
            DeployError::ClearFailed(report)
            | DeployError::UploadFailed(report)
            | DeployError::Cancelled(report) => Some(report),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_exposes_skipped_keys() {
        let err = DeployError::Cancelled(Box::new(BatchReport {
            attempted: 1,
            succeeded: 1,
            skipped: vec!["b.txt".to_string(), "c.txt".to_string()],
            failures: Vec::new(),
        }));

        assert_eq!(err.to_string(), "Deploy cancelled with 2 items not started");
        assert_eq!(err.batch_report().map(|r| r.skipped.len()), Some(2));
        assert!(DeployError::Config("x".to_string()).batch_report().is_none());
    }
}
