//! Defaults shared by configuration and the deploy pipeline.

/// Extensions gzip-compressed before upload unless configured otherwise.
pub const DEFAULT_GZIP_EXTENSIONS: &str =
    "html,htm,css,js,mjs,json,map,svg,txt,xml,wasm,dll,pdb,dat,blat,ico";

pub const DEFAULT_CACHE_CONTROL_MAX_AGE_SECONDS: u64 = 3600;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 16;

pub const DEFAULT_OPERATION_TIMEOUT_SECONDS: u64 = 60;

/// One attempt means no retry.
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 1;

pub const DEFAULT_RETRY_INITIAL_BACKOFF_MS: u64 = 200;

/// Extension of compressed artifacts removed from the source tree before upload.
pub const STALE_ARTIFACT_EXTENSION: &str = "gz";

pub const GZIP_CONTENT_ENCODING: &str = "gzip";
