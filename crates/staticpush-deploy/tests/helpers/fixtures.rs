//! Source tree fixtures.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

/// Create a source directory holding `files` (relative path with `/`, body).
pub fn site(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    for (relative, body) in files {
        write_file(dir.path(), relative, body);
    }
    dir
}

pub fn write_file(root: &Path, relative: &str, body: &[u8]) {
    let path = relative
        .split('/')
        .fold(root.to_path_buf(), |path, part| path.join(part));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(&path, body).expect("Failed to write fixture file");
}

/// A small published web app: markup, styles, a framework binary, an image and
/// an extensionless file.
pub fn sample_site() -> TempDir {
    site(&[
        ("index.html", b"<!DOCTYPE html><html><body>Hello</body></html>"),
        ("css/app.css", b"body { margin: 0; padding: 0; }"),
        ("_framework/app.dll", b"MZ\x90\x00\x03\x00\x00\x00"),
        ("img/logo.png", b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR"),
        ("CNAME", b"example.com"),
    ])
}
