//! staticpush core library
//!
//! Configuration, the storage backend enum, the reference content-type table
//! and the domain models shared by the storage, deploy and CLI crates.

pub mod config;
pub mod constants;
pub mod content_types;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{DeployConfig, RetrySettings, StorageConfig};
pub use content_types::{normalize_extension, ContentTypeMap, ContentTypeTable};
pub use models::{CorsPolicy, CorsRule, FileEntry, ObjectProperties, RemoteObject, UploadTarget};
pub use storage_types::StorageBackend;
