//! Source tree enumeration.
//!
//! Recursively walks the source directory and produces one `FileEntry` per
//! regular file, sorted by relative path. Symlinks are followed, so a linked
//! file or directory is published under the link's own path.

use std::path::Path;

use staticpush_core::{normalize_extension, FileEntry};
use walkdir::WalkDir;

use crate::error::DeployError;

/// Scan `root` recursively.
///
/// Fails on the first unreadable directory or entry, on a symlink loop, and on
/// paths that are not valid UTF-8 (they could not become object keys).
pub fn scan_files(root: &Path) -> Result<Vec<FileEntry>, DeployError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            DeployError::io(path, e.into())
        })?;

        // With follow_links, the file type is that of the link target.
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let metadata = entry
            .metadata()
            .map_err(|e| DeployError::io(path, e.into()))?;

        let relative = path
            .strip_prefix(root)
            .map_err(|_| DeployError::InvalidPath(path.to_path_buf()))?;
        if relative.to_str().is_none() {
            return Err(DeployError::InvalidPath(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|ext| normalize_extension(&ext.to_string_lossy()))
            .unwrap_or_default();

        files.push(FileEntry {
            relative_path: relative.to_path_buf(),
            absolute_path: path.to_path_buf(),
            extension,
            size: metadata.len(),
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}
