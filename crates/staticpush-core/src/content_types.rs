//! Reference content-type table and the per-run extension map.
//!
//! Extensions are compared case-insensitively everywhere: both the table and
//! the resolved map store them lowercase and without a leading dot.

use anyhow::Context;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Built-in extension to MIME type pairs.
const BUILTIN_CONTENT_TYPES: &[(&str, &str)] = &[
    // Documents
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xhtml", "application/xhtml+xml"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("cjs", "application/javascript"),
    ("json", "application/json"),
    ("jsonld", "application/ld+json"),
    ("webmanifest", "application/manifest+json"),
    ("map", "application/json"),
    ("xml", "application/xml"),
    ("rss", "application/rss+xml"),
    ("atom", "application/atom+xml"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("ics", "text/calendar"),
    ("pdf", "application/pdf"),
    ("rtf", "application/rtf"),
    ("appcache", "text/cache-manifest"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    // Audio and video
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("m4a", "audio/mp4"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("webm", "video/webm"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    ("ts", "video/mp2t"),
    ("vtt", "text/vtt"),
    // Binaries and archives
    ("wasm", "application/wasm"),
    ("dll", "application/octet-stream"),
    ("pdb", "application/octet-stream"),
    ("dat", "application/octet-stream"),
    ("blat", "application/octet-stream"),
    ("bin", "application/octet-stream"),
    ("exe", "application/octet-stream"),
    ("zip", "application/zip"),
    ("tar", "application/x-tar"),
    ("7z", "application/x-7z-compressed"),
    ("br", "application/x-brotli"),
];

/// Strip a leading dot, trim and lowercase an extension.
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// Static reference table used to resolve content types.
#[derive(Debug, Clone)]
pub struct ContentTypeTable {
    entries: HashMap<String, String>,
}

impl ContentTypeTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        let entries = BUILTIN_CONTENT_TYPES
            .iter()
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in table extended (and overridden) by a JSON object of
    /// `extension -> content type` read from `path`.
    pub fn builtin_with_overrides(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content type table {}", path.display()))?;
        let overrides: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid content type table {}", path.display()))?;

        let mut table = Self::builtin();
        table.extend(overrides);
        Ok(table)
    }

    pub fn extend<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (ext, mime) in pairs {
            let ext = normalize_extension(ext.as_ref());
            if !ext.is_empty() {
                self.entries.insert(ext, mime.into());
            }
        }
    }

    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.entries
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ContentTypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Extension to content type map resolved for one run.
///
/// Built once before uploads start and only read afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ContentTypeMap {
    default_content_type: String,
    entries: BTreeMap<String, String>,
}

impl ContentTypeMap {
    pub fn new(default_content_type: impl Into<String>) -> Self {
        Self {
            default_content_type: default_content_type.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, extension: &str, content_type: impl Into<String>) {
        self.entries
            .insert(normalize_extension(extension), content_type.into());
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.entries.contains_key(&normalize_extension(extension))
    }

    /// Content type for `extension`, or the default when it was never resolved.
    pub fn get(&self, extension: &str) -> &str {
        self.entries
            .get(&normalize_extension(extension))
            .map(String::as_str)
            .unwrap_or(&self.default_content_type)
    }

    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
