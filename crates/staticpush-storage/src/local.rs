use crate::traits::{validate_key, Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use staticpush_core::models::object_key_for;
use staticpush_core::{CorsPolicy, ObjectProperties, RemoteObject};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Directory under the base path holding object properties and the CORS policy.
const META_DIR: &str = ".staticpush";
const PROPERTIES_DIR: &str = "properties";
const CORS_FILE: &str = "cors.json";

/// Local filesystem storage implementation
///
/// Objects are plain files under `base_path`. Properties live in JSON sidecars
/// under `base_path/.staticpush/properties`, which listing never returns.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    container: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory acting as the container (e.g., "/var/www/site")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let container = base_path.display().to_string();

        Ok(LocalStorage {
            base_path,
            container,
        })
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        if storage_key.split('/').next() == Some(META_DIR) {
            return Err(StorageError::InvalidKey(format!(
                "Storage key uses the reserved {} directory",
                META_DIR
            )));
        }

        Ok(self.base_path.join(storage_key))
    }

    fn properties_path(&self, storage_key: &str) -> PathBuf {
        self.base_path
            .join(META_DIR)
            .join(PROPERTIES_DIR)
            .join(format!("{}.json", storage_key))
    }

    fn cors_path(&self) -> PathBuf {
        self.base_path.join(META_DIR).join(CORS_FILE)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        Ok(())
    }

    async fn remove_if_exists(path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn list(&self) -> StorageResult<Vec<RemoteObject>> {
        let mut objects = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                StorageError::ListFailed(format!("Failed to read {}: {}", dir.display(), e))
            })?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    if dir == self.base_path && entry.file_name() == META_DIR {
                        continue;
                    }
                    pending.push(path);
                } else if file_type.is_file() {
                    let relative = path
                        .strip_prefix(&self.base_path)
                        .map_err(|e| StorageError::ListFailed(e.to_string()))?;
                    objects.push(RemoteObject::from(object_key_for(relative)));
                }
            }
        }

        Ok(objects)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        Self::remove_if_exists(&path).await?;
        Self::remove_if_exists(&self.properties_path(storage_key)).await?;

        tracing::debug!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn put(
        &self,
        storage_key: &str,
        data: Bytes,
        properties: &ObjectProperties,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.write_file(&path, &data).await?;

        let sidecar = serde_json::to_vec_pretty(properties)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        self.write_file(&self.properties_path(storage_key), &sidecar)
            .await?;

        tracing::debug!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn get(&self, storage_key: &str) -> StorageResult<StoredObject> {
        let path = self.key_to_path(storage_key)?;

        let body = match fs::read(&path).await {
            Ok(data) => Bytes::from(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => {
                return Err(StorageError::DownloadFailed(format!(
                    "Failed to read file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let properties = match fs::read(self.properties_path(storage_key)).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| StorageError::BackendError(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ObjectProperties::default(),
            Err(e) => return Err(StorageError::IoError(e)),
        };

        Ok(StoredObject { body, properties })
    }

    async fn cors_policy(&self) -> StorageResult<CorsPolicy> {
        match fs::read(self.cors_path()).await {
            Ok(raw) => {
                serde_json::from_slice(&raw).map_err(|e| StorageError::BackendError(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CorsPolicy::default()),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn set_cors_policy(&self, policy: &CorsPolicy) -> StorageResult<()> {
        let raw = serde_json::to_vec_pretty(policy)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        self.write_file(&self.cors_path(), &raw).await?;

        tracing::info!(
            path = %self.cors_path().display(),
            rules = policy.rules.len(),
            "Local storage CORS policy updated"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    fn container(&self) -> &str {
        &self.container
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn props(content_type: &str) -> ObjectProperties {
        ObjectProperties {
            content_type: content_type.to_string(),
            cache_control: "public, max-age=3600".to_string(),
            content_encoding: None,
        }
    }

    #[tokio::test]
    async fn test_local_storage_put_get() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let mut properties = props("application/javascript");
        properties.content_encoding = Some("gzip".to_string());

        storage
            .put("js/app.js", Bytes::from_static(b"compressed"), &properties)
            .await
            .unwrap();

        let stored = storage.get("js/app.js").await.unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"compressed"));
        assert_eq!(stored.properties, properties);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        let result = storage.get("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .put("/etc/passwd", Bytes::new(), &props("text/plain"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete(".staticpush/cors.json").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_local_storage_list_skips_metadata() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        for key in ["index.html", "css/site.css", "_framework/wasm/dotnet.wasm"] {
            storage
                .put(key, Bytes::from_static(b"x"), &props("text/plain"))
                .await
                .unwrap();
        }
        storage
            .set_cors_policy(&CorsPolicy::wildcard_get())
            .await
            .unwrap();

        let mut keys: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.key)
            .collect();
        keys.sort();

        assert_eq!(
            keys,
            vec!["_framework/wasm/dotnet.wasm", "css/site.css", "index.html"]
        );
    }

    #[tokio::test]
    async fn test_local_storage_delete_removes_sidecar() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        storage
            .put("a.txt", Bytes::from_static(b"a"), &props("text/plain"))
            .await
            .unwrap();
        storage.delete("a.txt").await.unwrap();

        assert!(matches!(
            storage.get("a.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(!storage.properties_path("a.txt").exists());
        assert!(storage.delete("a.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_cors_default_empty() {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();

        assert!(storage.cors_policy().await.unwrap().is_empty());

        storage
            .set_cors_policy(&CorsPolicy::wildcard_get())
            .await
            .unwrap();
        assert_eq!(
            storage.cors_policy().await.unwrap(),
            CorsPolicy::wildcard_get()
        );
    }
}
