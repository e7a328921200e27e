//! Content-type resolution for the extensions present in one deploy.

use std::collections::BTreeSet;

use staticpush_core::{normalize_extension, ContentTypeMap, ContentTypeTable};

use crate::progress::{Phase, ProgressSink};

/// Result of resolving a set of extensions.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Holds an entry for every requested extension.
    pub map: ContentTypeMap,
    /// Non-empty extensions the reference table did not know.
    pub missing: Vec<String>,
}

impl Resolution {
    pub fn had_missing(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Maps extensions to content types through the reference table, falling back
/// to a default.
#[derive(Debug, Clone)]
pub struct ContentTypeResolver {
    table: ContentTypeTable,
    default_content_type: String,
}

impl ContentTypeResolver {
    pub fn new(table: ContentTypeTable, default_content_type: impl Into<String>) -> Self {
        Self {
            table,
            default_content_type: default_content_type.into(),
        }
    }

    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    pub fn resolve<'a, I>(&self, extensions: I, progress: &dyn ProgressSink) -> Resolution
    where
        I: IntoIterator<Item = &'a str>,
    {
        let extensions: BTreeSet<String> =
            extensions.into_iter().map(normalize_extension).collect();

        progress.phase_started(Phase::ResolveContentTypes, extensions.len());

        let mut map = ContentTypeMap::new(self.default_content_type.clone());
        let mut missing = Vec::new();

        for extension in &extensions {
            if extension.is_empty() {
                map.insert(extension, self.default_content_type.clone());
            } else if let Some(content_type) = self.table.lookup(extension) {
                map.insert(extension, content_type);
            } else {
                map.insert(extension, self.default_content_type.clone());
                progress.warn(&format!(
                    "No content type mapping for extension .{}",
                    extension
                ));
                missing.push(extension.clone());
            }
            progress.tick(Phase::ResolveContentTypes, extension);
        }

        if !missing.is_empty() {
            progress.warn(&format!(
                "{} extensions had no content type mapping; {} was used instead",
                missing.len(),
                self.default_content_type
            ));
        }

        progress.phase_finished(Phase::ResolveContentTypes);
        Resolution { map, missing }
    }
}

impl Default for ContentTypeResolver {
    fn default() -> Self {
        Self::new(
            ContentTypeTable::builtin(),
            staticpush_core::constants::DEFAULT_CONTENT_TYPE,
        )
    }
}
