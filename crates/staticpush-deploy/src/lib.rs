//! staticpush deploy pipeline
//!
//! Publishes a local build directory to a storage container in five stages:
//! sanitize stale `.gz` artifacts, audit missing extensions, resolve content
//! types, optionally clear the container, then upload every file with its
//! cache-control, content-type and (for gzip-compressed files)
//! content-encoding properties.
//!
//! Clearing always completes before the first upload starts.

pub mod auditor;
pub mod batch;
pub mod clearer;
pub mod cors;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod retry;
pub mod sanitizer;
pub mod scanner;
pub mod uploader;

// Re-export commonly used types
pub use batch::{BatchReport, ItemFailure, WorkerOptions};
pub use cors::{alter_cors, set_wildcard_cors};
pub use error::DeployError;
pub use pipeline::{DeployOptions, DeployReport, Deployer};
pub use progress::{Phase, ProgressEvent, ProgressSink, RecordingProgress, TracingProgress};
pub use resolver::{ContentTypeResolver, Resolution};
pub use retry::RetryPolicy;
pub use uploader::{gzip_bytes, plan_uploads, UploadSettings};
