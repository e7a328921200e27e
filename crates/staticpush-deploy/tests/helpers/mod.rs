//! Test helpers: source tree fixtures, storage wrappers and deployer setup.
//!
//! Run from workspace root: `cargo test -p staticpush-deploy`.

#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;
use staticpush_core::constants::DEFAULT_CONTENT_TYPE;
use staticpush_core::ContentTypeTable;
use staticpush_deploy::{
    ContentTypeResolver, DeployOptions, Deployer, RecordingProgress, RetryPolicy, UploadSettings,
    WorkerOptions,
};
use staticpush_storage::Storage;
use std::io::Read;

/// Options for a deploy of `source` with the given compressible extensions.
pub fn deploy_options(source: &Path, gzip_extensions: &[&str], clear: bool) -> DeployOptions {
    DeployOptions {
        source_dir: source.to_path_buf(),
        clear_container: clear,
        upload: UploadSettings {
            gzip_extensions: gzip_extensions
                .iter()
                .map(|ext| ext.to_string())
                .collect::<BTreeSet<_>>(),
            cache_control_max_age_seconds: 3600,
        },
        resolver: ContentTypeResolver::new(ContentTypeTable::builtin(), DEFAULT_CONTENT_TYPE),
        workers: WorkerOptions {
            concurrency: 4,
            operation_timeout: Duration::from_secs(5),
            retry: RetryPolicy::none(),
            ..Default::default()
        },
    }
}

/// Deployer wired to a recording progress sink.
pub fn deployer(
    storage: Arc<dyn Storage>,
    options: DeployOptions,
) -> (Deployer, Arc<RecordingProgress>) {
    let progress = Arc::new(RecordingProgress::new());
    let deployer = Deployer::new(storage, options).with_progress(progress.clone());
    (deployer, progress)
}

pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut decoded)
        .expect("Body is not valid gzip");
    decoded
}
