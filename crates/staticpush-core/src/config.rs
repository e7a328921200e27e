//! Configuration module
//!
//! Deploy settings are read from the environment (after loading `.env`), then
//! the CLI overrides individual fields from its flags.

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CACHE_CONTROL_MAX_AGE_SECONDS, DEFAULT_CONTENT_TYPE, DEFAULT_GZIP_EXTENSIONS,
    DEFAULT_OPERATION_TIMEOUT_SECONDS, DEFAULT_RETRY_INITIAL_BACKOFF_MS,
    DEFAULT_RETRY_MAX_ATTEMPTS, DEFAULT_UPLOAD_CONCURRENCY,
};
use crate::content_types::normalize_extension;
use crate::storage_types::StorageBackend;

/// Destination container settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket (S3) or container (Azure) name.
    pub container: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub azure_account: Option<String>,
    pub local_storage_path: Option<String>,
}

/// Bounded retry applied to deletes and uploads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_RETRY_INITIAL_BACKOFF_MS),
        }
    }
}

/// Settings for one deploy run
#[derive(Clone, Debug)]
pub struct DeployConfig {
    pub source_dir: Option<PathBuf>,
    pub storage: StorageConfig,
    /// Lowercase, without leading dots.
    pub gzip_extensions: BTreeSet<String>,
    pub cache_control_max_age_seconds: u64,
    pub default_content_type: String,
    pub clear_container: bool,
    pub concurrency: usize,
    pub operation_timeout: Duration,
    pub retry: RetrySettings,
    pub content_types_file: Option<PathBuf>,
}

impl DeployConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let storage = StorageConfig {
            backend,
            container: lookup("STORAGE_CONTAINER").or_else(|| lookup("S3_BUCKET")),
            s3_region: lookup("S3_REGION").or_else(|| lookup("AWS_REGION")),
            s3_endpoint: lookup("S3_ENDPOINT"),
            azure_account: lookup("AZURE_STORAGE_ACCOUNT_NAME"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
        };

        let config = DeployConfig {
            source_dir: lookup("STATICPUSH_SOURCE_DIR").map(PathBuf::from),
            storage,
            gzip_extensions: parse_extension_list(
                &lookup("GZIP_EXTENSIONS").unwrap_or_else(|| DEFAULT_GZIP_EXTENSIONS.to_string()),
            ),
            cache_control_max_age_seconds: parse_or(
                lookup("CACHE_CONTROL_MAX_AGE_SECONDS"),
                "CACHE_CONTROL_MAX_AGE_SECONDS",
                DEFAULT_CACHE_CONTROL_MAX_AGE_SECONDS,
            )?,
            default_content_type: lookup("DEFAULT_CONTENT_TYPE")
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            clear_container: lookup("CLEAR_CONTAINER")
                .map(|v| v.trim().to_lowercase())
                .map(|v| v == "true" || v == "1" || v == "yes")
                .unwrap_or(false),
            concurrency: parse_or(
                lookup("UPLOAD_CONCURRENCY"),
                "UPLOAD_CONCURRENCY",
                DEFAULT_UPLOAD_CONCURRENCY,
            )?,
            operation_timeout: Duration::from_secs(parse_or(
                lookup("OPERATION_TIMEOUT_SECONDS"),
                "OPERATION_TIMEOUT_SECONDS",
                DEFAULT_OPERATION_TIMEOUT_SECONDS,
            )?),
            retry: RetrySettings {
                max_attempts: parse_or(
                    lookup("RETRY_MAX_ATTEMPTS"),
                    "RETRY_MAX_ATTEMPTS",
                    DEFAULT_RETRY_MAX_ATTEMPTS,
                )?,
                initial_backoff: Duration::from_millis(parse_or(
                    lookup("RETRY_INITIAL_BACKOFF_MS"),
                    "RETRY_INITIAL_BACKOFF_MS",
                    DEFAULT_RETRY_INITIAL_BACKOFF_MS,
                )?),
            },
            content_types_file: lookup("STATICPUSH_CONTENT_TYPES_FILE").map(PathBuf::from),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.default_content_type.trim().is_empty() {
            return Err(anyhow::anyhow!("DEFAULT_CONTENT_TYPE must not be empty"));
        }
        if self.concurrency == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CONCURRENCY must be at least 1"));
        }
        if self.operation_timeout.is_zero() {
            return Err(anyhow::anyhow!("OPERATION_TIMEOUT_SECONDS must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(anyhow::anyhow!("RETRY_MAX_ATTEMPTS must be at least 1"));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.container.is_none() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_CONTAINER or S3_BUCKET must be set for the s3 backend"
                    ));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set for the s3 backend"
                    ));
                }
            }
            StorageBackend::Azure => {
                if self.storage.container.is_none() {
                    return Err(anyhow::anyhow!(
                        "STORAGE_CONTAINER must be set for the azure backend"
                    ));
                }
                if self.storage.azure_account.is_none() {
                    return Err(anyhow::anyhow!(
                        "AZURE_STORAGE_ACCOUNT_NAME must be set for the azure backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set for the local backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        Ok(())
    }

    /// Source directory, or an error naming how to set it.
    pub fn source_dir(&self) -> Result<&PathBuf, anyhow::Error> {
        self.source_dir.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Source directory not set (use --source or STATICPUSH_SOURCE_DIR)")
        })
    }
}

/// Parse a comma separated extension list into a normalized set.
pub fn parse_extension_list(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(normalize_extension)
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        None => Ok(default),
    }
}
