use crate::object;
use crate::traits::{Storage, StorageError, StorageResult, StoredObject};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::types::{CorsConfiguration, CorsRule as S3CorsRule};
use aws_sdk_s3::Client;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use staticpush_core::{CorsPolicy, CorsRule, ObjectProperties, RemoteObject};
use std::sync::Arc;

/// S3 storage implementation
///
/// Objects go through `object_store`; the bucket CORS configuration goes
/// through the AWS S3 SDK, which `object_store` does not cover.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    client: Client,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let region_provider = RegionProviderChain::first_try(aws_config::Region::new(region));
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let client = if let Some(ref endpoint) = endpoint_url {
            // Path-style addressing is required by MinIO and most S3-compatible providers
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&config)
        };

        Ok(S3Storage {
            store: Arc::new(store),
            client,
            bucket,
        })
    }
}

fn from_s3_rule(rule: &S3CorsRule) -> CorsRule {
    CorsRule {
        allowed_origins: rule.allowed_origins().to_vec(),
        allowed_methods: rule.allowed_methods().to_vec(),
        allowed_headers: rule.allowed_headers().to_vec(),
        exposed_headers: rule.expose_headers().to_vec(),
        max_age_seconds: rule.max_age_seconds().and_then(|s| u32::try_from(s).ok()),
    }
}

fn to_s3_rule(rule: &CorsRule) -> StorageResult<S3CorsRule> {
    let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());

    S3CorsRule::builder()
        .set_allowed_origins(Some(rule.allowed_origins.clone()))
        .set_allowed_methods(Some(rule.allowed_methods.clone()))
        .set_allowed_headers(non_empty(&rule.allowed_headers))
        .set_expose_headers(non_empty(&rule.exposed_headers))
        .set_max_age_seconds(rule.max_age_seconds.and_then(|s| i32::try_from(s).ok()))
        .build()
        .map_err(|e| StorageError::ConfigError(e.to_string()))
}

#[async_trait]
impl Storage for S3Storage {
    async fn list(&self) -> StorageResult<Vec<RemoteObject>> {
        object::list(&self.store, &self.bucket).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        object::delete(&self.store, &self.bucket, key).await
    }

    async fn put(
        &self,
        key: &str,
        data: Bytes,
        properties: &ObjectProperties,
    ) -> StorageResult<()> {
        object::put(&self.store, &self.bucket, key, data, properties).await
    }

    async fn get(&self, key: &str) -> StorageResult<StoredObject> {
        object::get(&self.store, key).await
    }

    async fn cors_policy(&self) -> StorageResult<CorsPolicy> {
        match self.client.get_bucket_cors().bucket(&self.bucket).send().await {
            Ok(output) => Ok(CorsPolicy {
                rules: output.cors_rules().iter().map(from_s3_rule).collect(),
            }),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .and_then(|service_error| service_error.code())
                    == Some("NoSuchCORSConfiguration");
                if missing {
                    Ok(CorsPolicy::default())
                } else {
                    Err(StorageError::BackendError(
                        DisplayErrorContext(&e).to_string(),
                    ))
                }
            }
        }
    }

    async fn set_cors_policy(&self, policy: &CorsPolicy) -> StorageResult<()> {
        if policy.is_empty() {
            self.client
                .delete_bucket_cors()
                .bucket(&self.bucket)
                .send()
                .await
                .map_err(|e| StorageError::BackendError(DisplayErrorContext(&e).to_string()))?;

            tracing::info!(bucket = %self.bucket, "S3 bucket CORS configuration removed");
            return Ok(());
        }

        let rules = policy
            .rules
            .iter()
            .map(to_s3_rule)
            .collect::<StorageResult<Vec<_>>>()?;
        let configuration = CorsConfiguration::builder()
            .set_cors_rules(Some(rules))
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        self.client
            .put_bucket_cors()
            .bucket(&self.bucket)
            .cors_configuration(configuration)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    bucket = %self.bucket,
                    "S3 put bucket CORS failed"
                );
                StorageError::BackendError(DisplayErrorContext(&e).to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            rules = policy.rules.len(),
            "S3 bucket CORS configuration updated"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    fn container(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_rule_conversion_keeps_fields() {
        let rule = CorsRule {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
            allowed_headers: vec![],
            exposed_headers: vec!["ETag".to_string()],
            max_age_seconds: Some(600),
        };

        let s3_rule = to_s3_rule(&rule).unwrap();
        assert_eq!(from_s3_rule(&s3_rule), rule);
    }
}
