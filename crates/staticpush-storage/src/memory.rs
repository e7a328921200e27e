use crate::object;
use crate::traits::{Storage, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use staticpush_core::{CorsPolicy, ObjectProperties, RemoteObject};
use std::sync::{Arc, RwLock};

/// In-process container backed by `object_store`'s `InMemory` store.
///
/// Used by tests and for rehearsing a deploy without network access.
#[derive(Clone)]
pub struct MemoryStorage {
    store: Arc<dyn ObjectStore>,
    container: String,
    cors: Arc<RwLock<CorsPolicy>>,
}

impl MemoryStorage {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            container: container.into(),
            cors: Arc::new(RwLock::new(CorsPolicy::default())),
        }
    }

    /// Sorted keys currently stored.
    pub async fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = object::list(&self.store, &self.container)
            .await?
            .into_iter()
            .map(|object| object.key)
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl Storage for MemoryStorage {
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
        Ok(self
            .cors
            .read()
            .map(|policy| policy.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone()))
    }

    async fn set_cors_policy(&self, policy: &CorsPolicy) -> StorageResult<()> {
        let mut guard = self
            .cors
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = policy.clone();
        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    fn container(&self) -> &str {
        &self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageError;

    fn props(content_type: &str, encoding: Option<&str>) -> ObjectProperties {
        ObjectProperties {
            content_type: content_type.to_string(),
            cache_control: "public, max-age=60".to_string(),
            content_encoding: encoding.map(String::from),
        }
    }

    #[tokio::test]
    async fn put_get_keeps_properties() {
        let storage = MemoryStorage::new("site");
        let properties = props("text/css", Some("gzip"));

        storage
            .put("css/site.css", Bytes::from_static(b"body{}"), &properties)
            .await
            .unwrap();

        let stored = storage.get("css/site.css").await.unwrap();
        assert_eq!(stored.body, Bytes::from_static(b"body{}"));
        assert_eq!(stored.properties, properties);
    }

    #[tokio::test]
    async fn list_and_delete() {
        let storage = MemoryStorage::new("site");
        for key in ["a.txt", "b/c.txt", "b/d/e.txt"] {
            storage
                .put(key, Bytes::from_static(b"x"), &props("text/plain", None))
                .await
                .unwrap();
        }

        assert_eq!(storage.keys().await.unwrap(), vec!["a.txt", "b/c.txt", "b/d/e.txt"]);

        storage.delete("b/c.txt").await.unwrap();
        storage.delete("missing.txt").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["a.txt", "b/d/e.txt"]);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let storage = MemoryStorage::default();
        let result = storage.get("nope.html").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn cors_policy_round_trip() {
        let storage = MemoryStorage::default();
        assert!(storage.cors_policy().await.unwrap().is_empty());

        storage
            .set_cors_policy(&CorsPolicy::wildcard_get())
            .await
            .unwrap();
        assert_eq!(storage.cors_policy().await.unwrap(), CorsPolicy::wildcard_get());
    }
}
