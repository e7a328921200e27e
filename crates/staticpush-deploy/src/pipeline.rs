//! Deploy orchestration.
//!
//! Runs the stages in order: sanitize, scan and audit, resolve content types,
//! clear (optional), upload. Local problems stop the run before anything
//! remote is touched.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use staticpush_core::constants::STALE_ARTIFACT_EXTENSION;
use staticpush_core::{
    ContentTypeMap, ContentTypeTable, DeployConfig, FileEntry, StorageBackend, UploadTarget,
};
use staticpush_storage::Storage;
use tokio_util::sync::CancellationToken;

use crate::auditor::report_files_without_extension;
use crate::batch::{BatchReport, WorkerOptions};
use crate::clearer::clear_container;
use crate::error::DeployError;
use crate::progress::{ProgressSink, TracingProgress};
use crate::resolver::ContentTypeResolver;
use crate::retry::RetryPolicy;
use crate::sanitizer::remove_stale_artifacts;
use crate::scanner::scan_files;
use crate::uploader::{plan_uploads, upload_files, UploadSettings};

/// Everything one deploy run needs besides the storage handle.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub source_dir: PathBuf,
    pub clear_container: bool,
    pub upload: UploadSettings,
    pub resolver: ContentTypeResolver,
    pub workers: WorkerOptions,
}

impl DeployOptions {
    /// Build options from validated configuration, loading the content type
    /// table file when one is configured.
    pub fn from_config(config: &DeployConfig) -> Result<Self, DeployError> {
        let source_dir = config
            .source_dir()
            .map_err(|e| DeployError::Config(e.to_string()))?
            .clone();

        let table = match &config.content_types_file {
            Some(path) => ContentTypeTable::builtin_with_overrides(path)
                .map_err(|e| DeployError::Config(format!("{:#}", e)))?,
            None => ContentTypeTable::builtin(),
        };

        Ok(Self {
            source_dir,
            clear_container: config.clear_container,
            upload: UploadSettings::from_config(config),
            resolver: ContentTypeResolver::new(table, config.default_content_type.clone()),
            workers: WorkerOptions {
                concurrency: config.concurrency,
                operation_timeout: config.operation_timeout,
                retry: RetryPolicy::from(&config.retry),
                cancel: CancellationToken::new(),
            },
        })
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub backend: StorageBackend,
    pub container: String,
    pub source_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: f64,
    /// Stale `.gz` files deleted from the source tree.
    pub sanitized: Vec<PathBuf>,
    pub files_without_extension: Vec<PathBuf>,
    pub content_types: ContentTypeMap,
    pub missing_content_types: Vec<String>,
    /// `None` when clearing was not requested.
    pub cleared: Option<BatchReport>,
    pub uploaded: BatchReport,
}

/// Runs deploys against one storage container.
pub struct Deployer {
    storage: Arc<dyn Storage>,
    progress: Arc<dyn ProgressSink>,
    options: DeployOptions,
}

impl Deployer {
    pub fn new(storage: Arc<dyn Storage>, options: DeployOptions) -> Self {
        Self {
            storage,
            progress: Arc::new(TracingProgress::new()),
            options,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// Token that stops new items from starting when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.options.workers.cancel.clone()
    }

    pub async fn run(&self) -> Result<DeployReport, DeployError> {
        let started_at = Utc::now();
        let start = Instant::now();
        let source_dir = self.options.source_dir.clone();
        let progress = self.progress.as_ref();

        tracing::info!(
            source_dir = %source_dir.display(),
            backend = %self.storage.backend_type(),
            container = %self.storage.container(),
            clear_container = self.options.clear_container,
            "Starting deploy"
        );

        let sanitized = {
            let progress = self.progress.clone();
            blocking(&source_dir, move |root| {
                remove_stale_artifacts(root, progress.as_ref())
            })
            .await?
        };

        let files = blocking(&source_dir, |root| scan_files(root)).await?;
        tracing::info!(
            file_count = files.len(),
            total_bytes = files.iter().map(|f| f.size).sum::<u64>(),
            "Source scanned"
        );

        let files_without_extension = report_files_without_extension(&files, progress);
        let resolution = self
            .options
            .resolver
            .resolve(distinct_extensions(&files).iter().map(String::as_str), progress);

        self.ensure_not_cancelled()?;

        // Clearing must be fully joined before the first upload starts.
        let cleared = if self.options.clear_container {
            Some(clear_container(self.storage.as_ref(), &self.options.workers, progress).await?)
        } else {
            None
        };

        self.ensure_not_cancelled()?;

        let uploaded = upload_files(
            self.storage.as_ref(),
            &files,
            &self.options.upload,
            &resolution.map,
            &self.options.workers,
            progress,
        )
        .await?;

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            container = %self.storage.container(),
            uploaded = uploaded.succeeded,
            duration_ms,
            "Deploy finished"
        );

        Ok(DeployReport {
            backend: self.storage.backend_type(),
            container: self.storage.container().to_string(),
            source_dir,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            sanitized,
            files_without_extension,
            content_types: resolution.map,
            missing_content_types: resolution.missing,
            cleared,
            uploaded,
        })
    }

    /// Compute the upload targets without changing local or remote state.
    ///
    /// Stale `.gz` files are left in place and excluded from the plan.
    pub async fn plan(&self) -> Result<Vec<UploadTarget>, DeployError> {
        let files: Vec<FileEntry> = blocking(&self.options.source_dir, |root| scan_files(root))
            .await?
            .into_iter()
            .filter(|file| file.extension != STALE_ARTIFACT_EXTENSION)
            .collect();

        let resolution = self.options.resolver.resolve(
            distinct_extensions(&files).iter().map(String::as_str),
            self.progress.as_ref(),
        );

        Ok(plan_uploads(&files, &self.options.upload, &resolution.map))
    }

    fn ensure_not_cancelled(&self) -> Result<(), DeployError> {
        if self.options.workers.cancel.is_cancelled() {
            Err(DeployError::Cancelled(Box::default()))
        } else {
            Ok(())
        }
    }
}

fn distinct_extensions(files: &[FileEntry]) -> BTreeSet<String> {
    files.iter().map(|file| file.extension.clone()).collect()
}

/// Run a filesystem stage on the blocking pool.
async fn blocking<T, F>(root: &Path, f: F) -> Result<T, DeployError>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T, DeployError> + Send + 'static,
{
    let root_owned = root.to_path_buf();
    tokio::task::spawn_blocking(move || f(&root_owned))
        .await
        .map_err(|e| DeployError::io(root, std::io::Error::other(e)))?
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer")
            .field("backend", &self.storage.backend_type())
            .field("container", &self.storage.container())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> DeployConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DeployConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn options_follow_config() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("STATICPUSH_SOURCE_DIR", "/srv/site"),
            ("CLEAR_CONTAINER", "true"),
            ("UPLOAD_CONCURRENCY", "4"),
            ("OPERATION_TIMEOUT_SECONDS", "5"),
            ("RETRY_MAX_ATTEMPTS", "3"),
        ]);

        let options = DeployOptions::from_config(&config).unwrap();

        assert_eq!(options.source_dir, PathBuf::from("/srv/site"));
        assert!(options.clear_container);
        assert_eq!(options.workers.concurrency, 4);
        assert_eq!(options.workers.operation_timeout, Duration::from_secs(5));
        assert_eq!(options.workers.retry.max_attempts(), 3);
    }

    #[test]
    fn missing_source_dir_is_a_config_error() {
        let config = config_from(&[("STORAGE_BACKEND", "memory")]);
        assert!(matches!(
            DeployOptions::from_config(&config),
            Err(DeployError::Config(_))
        ));
    }

    #[test]
    fn unreadable_content_type_file_is_a_config_error() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("STATICPUSH_SOURCE_DIR", "/srv/site"),
            ("STATICPUSH_CONTENT_TYPES_FILE", "/nonexistent/types.json"),
        ]);
        assert!(matches!(
            DeployOptions::from_config(&config),
            Err(DeployError::Config(_))
        ));
    }
}
