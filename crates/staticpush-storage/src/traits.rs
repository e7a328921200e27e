//! Storage abstraction trait
//!
//! This module defines the Storage trait that all container backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use staticpush_core::{CorsPolicy, ObjectProperties, RemoteObject};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Operation not supported by the {backend} backend: {operation}")]
    Unsupported {
        backend: StorageBackend,
        operation: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An object body together with its stored properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub properties: ObjectProperties,
}

/// Storage abstraction trait
///
/// One instance addresses one container. Implementations must be safe to
/// share across the upload and delete workers.
#[async_trait]
pub trait Storage: Send + Sync {
    /// List every object in the container, across all pages.
    async fn list(&self) -> StorageResult<Vec<RemoteObject>>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Upload `data` under `key` with its properties, replacing any existing object.
    async fn put(&self, key: &str, data: Bytes, properties: &ObjectProperties)
        -> StorageResult<()>;

    /// Fetch an object body and its properties.
    async fn get(&self, key: &str) -> StorageResult<StoredObject>;

    /// Current CORS policy of the storage service. Empty when none is set.
    async fn cors_policy(&self) -> StorageResult<CorsPolicy>;

    /// Replace the CORS policy. An empty policy removes all rules.
    async fn set_cors_policy(&self, policy: &CorsPolicy) -> StorageResult<()>;

    fn backend_type(&self) -> StorageBackend;

    /// Bucket or container name, for logging.
    fn container(&self) -> &str;
}

/// Reject keys that are empty, absolute, or contain parent-directory segments.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid segments: {}",
            key
        )));
    }
    Ok(())
}
