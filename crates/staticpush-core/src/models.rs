//! Domain models shared across the deploy pipeline and storage backends.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::constants::GZIP_CONTENT_ENCODING;

/// A file discovered under the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub absolute_path: PathBuf,
    /// Path relative to the source root.
    pub relative_path: PathBuf,
    /// Lowercase, without the leading dot. Empty when the file has none.
    pub extension: String,
    pub size: u64,
}

impl FileEntry {
    pub fn object_key(&self) -> String {
        object_key_for(&self.relative_path)
    }

    pub fn has_extension(&self) -> bool {
        !self.extension.is_empty()
    }
}

/// Join the normal components of a relative path with `/`, whatever the host
/// separator is.
pub fn object_key_for(relative_path: &Path) -> String {
    relative_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// HTTP `Cache-Control` value for a max-age in seconds.
pub fn cache_control_header(max_age_seconds: u64) -> String {
    format!("public, max-age={}", max_age_seconds)
}

/// Metadata stored alongside an object body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectProperties {
    pub content_type: String,
    pub cache_control: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
}

/// Where and how one file is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadTarget {
    pub key: String,
    pub compress: bool,
    pub cache_control: String,
    pub content_type: String,
}

impl UploadTarget {
    pub fn properties(&self) -> ObjectProperties {
        ObjectProperties {
            content_type: self.content_type.clone(),
            cache_control: self.cache_control.clone(),
            content_encoding: self.compress.then(|| GZIP_CONTENT_ENCODING.to_string()),
        }
    }
}

/// An object already present in the destination container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RemoteObject {
    pub key: String,
}

impl From<String> for RemoteObject {
    fn from(key: String) -> Self {
        Self { key }
    }
}

/// One cross-origin resource sharing rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsRule {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    #[serde(default)]
    pub exposed_headers: Vec<String>,
    #[serde(default)]
    pub max_age_seconds: Option<u32>,
}

/// The storage service CORS policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsPolicy {
    pub rules: Vec<CorsRule>,
}

impl CorsPolicy {
    /// A single rule allowing `GET` from any origin.
    pub fn wildcard_get() -> Self {
        Self {
            rules: vec![CorsRule {
                allowed_origins: vec!["*".to_string()],
                allowed_methods: vec!["GET".to_string()],
                ..Default::default()
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
