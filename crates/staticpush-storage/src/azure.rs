use crate::object;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::ObjectStore;
use staticpush_core::{CorsPolicy, ObjectProperties, RemoteObject};
use std::sync::Arc;

/// Azure Blob Storage container backed by `object_store`.
///
/// Credentials are picked up from the `AZURE_STORAGE_*` environment variables.
/// Blob service properties (CORS) are not exposed by `object_store`.
#[derive(Clone)]
pub struct AzureStorage {
    store: Arc<dyn ObjectStore>,
    container: String,
}

impl AzureStorage {
    pub fn new(account: String, container: String) -> StorageResult<Self> {
        let store = MicrosoftAzureBuilder::from_env()
            .with_account(account)
            .with_container_name(container.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(AzureStorage {
            store: Arc::new(store),
            container,
        })
    }
}

#[async_trait]
impl Storage for AzureStorage {
    async fn list(&self) -> StorageResult<Vec<RemoteObject>> {
        object::list(&self.store, &self.container).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        object::delete(&self.store, &self.container, key).await
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        properties: &ObjectProperties,
    ) -> StorageResult<()> {
        object::put(&self.store, &self.container, key, data, properties).await
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        object::get(&self.store, key).await
    }

    async fn cors_policy(&self) -> StorageResult<CorsPolicy> {
        Err(StorageError::Unsupported {
            backend: StorageBackend::Azure,
            operation: "get CORS policy",
        })
    }

    async fn set_cors_policy(&self, _policy: &CorsPolicy) -> StorageResult<()> {
        Err(StorageError::Unsupported {
            backend: StorageBackend::Azure,
            operation: "set CORS policy",
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Azure
    }

    fn container(&self) -> &str {
        &self.container
    }
}
