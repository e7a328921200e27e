use std::path::PathBuf;

use staticpush_core::FileEntry;

use crate::progress::{Phase, ProgressSink};

/// Warn about files without an extension. Returns their relative paths.
///
/// Purely informational: such files are still uploaded with the default
/// content type.
pub fn report_files_without_extension(
    files: &[FileEntry],
    progress: &dyn ProgressSink,
) -> Vec<PathBuf> {
    let missing: Vec<PathBuf> = files
        .iter()
        .filter(|entry| !entry.has_extension())
        .map(|entry| entry.relative_path.clone())
        .collect();

    if missing.is_empty() {
        return missing;
    }

    progress.warn(&format!("Found {} files with no extension", missing.len()));
    progress.phase_started(Phase::Audit, missing.len());
    for path in &missing {
        let display = path.display().to_string();
        progress.warn(&format!("No file extension - {}", display));
        progress.tick(Phase::Audit, &display);
    }
    progress.phase_finished(Phase::Audit);

    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressEvent, RecordingProgress};

    fn entry(relative: &str, extension: &str) -> FileEntry {
        FileEntry {
            absolute_path: PathBuf::from("/site").join(relative),
            relative_path: PathBuf::from(relative),
            extension: extension.to_string(),
            size: 1,
        }
    }

    #[test]
    fn reports_count_and_each_path() {
        let files = vec![
            entry("index.html", "html"),
            entry("LICENSE", ""),
            entry("docs/CNAME", ""),
        ];
        let progress = RecordingProgress::new();

        let missing = report_files_without_extension(&files, &progress);

        assert_eq!(
            missing,
            vec![PathBuf::from("LICENSE"), PathBuf::from("docs/CNAME")]
        );
        let warnings = progress.warnings();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("2 files"));

        let events = progress.events();
        assert!(events.contains(&ProgressEvent::Started {
            phase: Phase::Audit,
            total: 2
        }));
        assert_eq!(progress.ticks(Phase::Audit), 2);
        assert_eq!(
            events.last(),
            Some(&ProgressEvent::Finished { phase: Phase::Audit })
        );
    }

    #[test]
    fn silent_when_all_have_extensions() {
        let progress = RecordingProgress::new();
        let missing = report_files_without_extension(&[entry("a.css", "css")], &progress);
        assert!(missing.is_empty());
        assert!(progress.events().is_empty());
    }
}
