//! Upload stage.
//!
//! Each file is read whole, optionally gzip-compressed, and put under its
//! relative-path key with its properties in a single call.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use staticpush_core::models::cache_control_header;
use staticpush_core::{normalize_extension, ContentTypeMap, DeployConfig, FileEntry, UploadTarget};
use staticpush_storage::Storage;

use crate::batch::{run_batch, BatchReport, WorkerOptions};
use crate::error::DeployError;
use crate::progress::{Phase, ProgressSink};

/// Per-run upload parameters.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    /// Lowercase extensions uploaded gzip-compressed.
    pub gzip_extensions: BTreeSet<String>,
    pub cache_control_max_age_seconds: u64,
}

impl UploadSettings {
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            gzip_extensions: config.gzip_extensions.clone(),
            cache_control_max_age_seconds: config.cache_control_max_age_seconds,
        }
    }

    pub fn is_compressible(&self, extension: &str) -> bool {
        self.gzip_extensions
            .contains(&normalize_extension(extension))
    }
}

/// Work out key and properties for each file without touching any state.
pub fn plan_uploads(
    files: &[FileEntry],
    settings: &UploadSettings,
    content_types: &ContentTypeMap,
) -> Vec<UploadTarget> {
    let cache_control = cache_control_header(settings.cache_control_max_age_seconds);
    files
        .iter()
        .map(|file| UploadTarget {
            key: file.object_key(),
            compress: settings.is_compressible(&file.extension),
            cache_control: cache_control.clone(),
            content_type: content_types.get(&file.extension).to_string(),
        })
        .collect()
}

/// Gzip `data` in memory at the default level.
pub fn gzip_bytes(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Upload every file, collecting per-file failures.
///
/// Returns `UploadFailed` once all files were attempted if any of them failed.
pub async fn upload_files(
    storage: &dyn Storage,
    files: &[FileEntry],
    settings: &UploadSettings,
    content_types: &ContentTypeMap,
    options: &WorkerOptions,
    progress: &dyn ProgressSink,
) -> Result<BatchReport, DeployError> {
    let start = Instant::now();
    let jobs: Vec<(PathBuf, UploadTarget)> = files
        .iter()
        .map(|file| file.absolute_path.clone())
        .zip(plan_uploads(files, settings, content_types))
        .collect();

    let report = run_batch(
        Phase::Upload,
        jobs,
        options,
        progress,
        |(_, target)| target.key.clone(),
        |(path, target)| async move { upload_one(storage, &path, &target, options).await },
    )
    .await;

    if !report.failures.is_empty() {
        return Err(DeployError::UploadFailed(Box::new(report)));
    }
    if !report.skipped.is_empty() {
        return Err(DeployError::Cancelled(Box::new(report)));
    }

    tracing::info!(
        container = %storage.container(),
        uploaded = report.succeeded,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Upload finished"
    );

    Ok(report)
}

async fn upload_one(
    storage: &dyn Storage,
    path: &std::path::Path,
    target: &UploadTarget,
    options: &WorkerOptions,
) -> Result<(), String> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let original_size = raw.len();

    let body = if target.compress {
        let compressed = tokio::task::spawn_blocking(move || gzip_bytes(&raw))
            .await
            .map_err(|e| format!("Compression task failed: {}", e))?
            .map_err(|e| format!("Failed to compress {}: {}", path.display(), e))?;
        Bytes::from(compressed)
    } else {
        Bytes::from(raw)
    };

    let properties = target.properties();
    let size_bytes = body.len();
    // Bytes clones share the buffer, so a retry does not copy the body.
    options
        .call("put", &target.key, || {
            storage.put(&target.key, body.clone(), &properties)
        })
        .await?;

    tracing::debug!(
        key = %target.key,
        size_bytes,
        original_size,
        compressed = target.compress,
        content_type = %target.content_type,
        "File uploaded"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn settings() -> UploadSettings {
        UploadSettings {
            gzip_extensions: ["html", "js"].iter().map(|s| s.to_string()).collect(),
            cache_control_max_age_seconds: 3600,
        }
    }

    fn entry(relative: &str, extension: &str) -> FileEntry {
        FileEntry {
            absolute_path: PathBuf::from("/site").join(relative),
            relative_path: PathBuf::from(relative),
            extension: extension.to_string(),
            size: 0,
        }
    }

    #[test]
    fn gzip_round_trips() {
        let data = b"<html><body>hello hello hello</body></html>".repeat(20);
        let compressed = gzip_bytes(&data).unwrap();
        assert!(compressed.len() < data.len());

        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn plan_assigns_keys_and_properties() {
        let mut content_types = ContentTypeMap::new("application/octet-stream");
        content_types.insert("html", "text/html");
        content_types.insert("png", "image/png");

        let targets = plan_uploads(
            &[
                entry("index.html", "html"),
                entry("img/logo.png", "png"),
                entry("LICENSE", ""),
            ],
            &settings(),
            &content_types,
        );

        assert_eq!(targets[0].key, "index.html");
        assert!(targets[0].compress);
        assert_eq!(targets[0].content_type, "text/html");
        assert_eq!(targets[0].cache_control, "public, max-age=3600");
        assert_eq!(
            targets[0].properties().content_encoding.as_deref(),
            Some("gzip")
        );

        assert_eq!(targets[1].key, "img/logo.png");
        assert!(!targets[1].compress);
        assert_eq!(targets[1].properties().content_encoding, None);

        assert_eq!(targets[2].content_type, "application/octet-stream");
    }

    #[test]
    fn compressible_check_ignores_case() {
        assert!(settings().is_compressible("HTML"));
        assert!(settings().is_compressible(".js"));
        assert!(!settings().is_compressible("png"));
    }
}
