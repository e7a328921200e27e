//! Storage wrappers that inject failures into an in-memory backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use staticpush_core::{CorsPolicy, ObjectProperties, RemoteObject, StorageBackend};
use staticpush_storage::{MemoryStorage, Storage, StorageError, StorageResult, StoredObject};
use tokio_util::sync::CancellationToken;

/// Delegates to `MemoryStorage`, failing puts and deletes for chosen keys,
/// stalling listings, or cancelling the run after the first put.
pub struct FlakyStorage {
    pub inner: MemoryStorage,
    fail_puts: HashSet<String>,
    fail_deletes: HashSet<String>,
    /// Fail the first N puts of every key, then succeed.
    transient_put_failures: usize,
    put_attempts: AtomicUsize,
    delete_attempts: AtomicUsize,
    list_delay: Option<Duration>,
    cancel_after_first_put: Option<CancellationToken>,
}

impl FlakyStorage {
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            fail_puts: HashSet::new(),
            fail_deletes: HashSet::new(),
            transient_put_failures: 0,
            put_attempts: AtomicUsize::new(0),
            delete_attempts: AtomicUsize::new(0),
            list_delay: None,
            cancel_after_first_put: None,
        }
    }

    pub fn failing_puts(mut self, keys: &[&str]) -> Self {
        self.fail_puts = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn failing_deletes(mut self, keys: &[&str]) -> Self {
        self.fail_deletes = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn transient_put_failures(mut self, count: usize) -> Self {
        self.transient_put_failures = count;
        self
    }

    pub fn slow_list(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn cancel_after_first_put(mut self, token: CancellationToken) -> Self {
        self.cancel_after_first_put = Some(token);
        self
    }

    pub fn put_attempts(&self) -> usize {
        self.put_attempts.load(Ordering::SeqCst)
    }

    pub fn delete_attempts(&self) -> usize {
        self.delete_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn list(&self) -> StorageResult<Vec<RemoteObject>> {
        if let Some(delay) = self.list_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.list().await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.delete_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.contains(key) {
            return Err(StorageError::DeleteFailed(format!("injected failure for {}", key)));
        }
        self.inner.delete(key).await
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        properties: &ObjectProperties,
    ) -> StorageResult<()> {
        let attempt = self.put_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.contains(key) {
            return Err(StorageError::UploadFailed(format!("injected failure for {}", key)));
        }
        if attempt < self.transient_put_failures {
            return Err(StorageError::UploadFailed("transient failure".to_string()));
        }
        self.inner.put(key, data, properties).await?;
        if let Some(token) = &self.cancel_after_first_put {
            token.cancel();
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        self.inner.get(key).await
    }

    async fn cors_policy(&self) -> StorageResult<CorsPolicy> {
        self.inner.cors_policy().await
    }

    async fn set_cors_policy(&self, policy: &CorsPolicy) -> StorageResult<()> {
        self.inner.set_cors_policy(policy).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    fn container(&self) -> &str {
        self.inner.container()
    }
}
