use std::path::{Path, PathBuf};

use staticpush_core::constants::STALE_ARTIFACT_EXTENSION;

use crate::error::DeployError;
use crate::progress::{Phase, ProgressSink};
use crate::scanner::scan_files;

/// Delete previously generated `.gz` files under `root`.
///
/// Returns the deleted paths. The first failed deletion aborts the run.
pub fn remove_stale_artifacts(
    root: &Path,
    progress: &dyn ProgressSink,
) -> Result<Vec<PathBuf>, DeployError> {
    let stale: Vec<PathBuf> = scan_files(root)?
        .into_iter()
        .filter(|entry| entry.extension == STALE_ARTIFACT_EXTENSION)
        .map(|entry| entry.absolute_path)
        .collect();

    if stale.is_empty() {
        return Ok(stale);
    }

    progress.warn(&format!(
        "Found {} files with extension .{}; they are not needed for deploy and will be deleted",
        stale.len(),
        STALE_ARTIFACT_EXTENSION
    ));
    progress.phase_started(Phase::Sanitize, stale.len());

    for path in &stale {
        std::fs::remove_file(path).map_err(|e| DeployError::io(path, e))?;
        progress.tick(Phase::Sanitize, &path.display().to_string());
        tracing::info!(path = %path.display(), "Deleted stale artifact");
    }

    progress.phase_finished(Phase::Sanitize);
    Ok(stale)
}
