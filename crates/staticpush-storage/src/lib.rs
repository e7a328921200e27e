//! staticpush storage library
//!
//! The `Storage` trait is the only surface the deploy pipeline talks to. Each
//! backend maps a single container (bucket) and exposes listing, deletion,
//! uploads with object properties, and the service CORS policy.
//!
//! # Object keys
//!
//! Keys are relative paths joined with `/`. They must not contain `..` or
//! start with `/`.

pub mod factory;
#[cfg(any(
    feature = "storage-s3",
    feature = "storage-azure",
    feature = "storage-memory"
))]
pub(crate) mod object;
#[cfg(feature = "storage-azure")]
pub mod azure;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-azure")]
pub use azure::AzureStorage;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-memory")]
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use staticpush_core::StorageBackend;
pub use traits::{validate_key, Storage, StorageError, StorageResult, StoredObject};
