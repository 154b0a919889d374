//! Candidate discovery.
//!
//! Walks the target directory recursively and collects every regular file
//! whose extension is one of the configured candidate extensions. Matching
//! is by extension only; file contents are never inspected.
//!
//! Order is deterministic: entries are sorted by file name within each
//! directory and the tree is walked depth-first.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::ScanSettings;
use crate::runner::{RunError, RunResult};

/// A file selected for remuxing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Full path to the file.
    pub path: PathBuf,
    /// Path relative to the scanned root.
    pub relative: PathBuf,
}

/// Check that `root` exists, is a directory and can be listed.
pub fn validate_root(root: &Path) -> RunResult<()> {
    let metadata = fs::metadata(root).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RunError::path(root, "directory does not exist")
        } else {
            RunError::path(root, format!("cannot access directory: {}", e))
        }
    })?;

    if !metadata.is_dir() {
        return Err(RunError::path(root, "not a directory"));
    }

    fs::read_dir(root)
        .map_err(|e| RunError::path(root, format!("directory is not readable: {}", e)))?;

    Ok(())
}

/// Whether the file name looks like an output of a previous run.
fn is_prior_output(path: &Path, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.ends_with(marker))
        .unwrap_or(false)
}

/// Whether `path` has a candidate extension.
fn has_candidate_extension(path: &Path, scan: &ScanSettings) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| scan.matches_extension(ext))
        .unwrap_or(false)
}

/// Discover all candidates under `root`.
///
/// The returned list is complete before any work is dispatched, so files
/// created while the run is in progress are never picked up.
///
/// # Errors
///
/// Returns `RunError::Path` if the root is missing, not a directory or
/// unreadable, or if any directory in the tree cannot be read.
pub fn discover_candidates(root: &Path, scan: &ScanSettings) -> RunResult<Vec<Candidate>> {
    validate_root(root)?;

    let mut candidates = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(scan.follow_links)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RunError::path(&path, format!("failed to read: {}", e))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_candidate_extension(path, scan) {
            continue;
        }

        if is_prior_output(path, &scan.output_marker) {
            tracing::debug!("Skipping prior output {}", path.display());
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        candidates.push(Candidate {
            path: path.to_path_buf(),
            relative,
        });
    }

    tracing::debug!(
        "Discovered {} candidate(s) under {}",
        candidates.len(),
        root.display()
    );

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"data").unwrap();
    }

    fn names(candidates: &[Candidate]) -> Vec<String> {
        candidates
            .iter()
            .map(|c| c.relative.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn missing_root_is_path_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = discover_candidates(&missing, &ScanSettings::default()).unwrap_err();
        assert!(matches!(err, RunError::Path { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn file_root_is_path_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("video.mp4");
        touch(&file);
        let err = discover_candidates(&file, &ScanSettings::default()).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn empty_directory_has_no_candidates() {
        let dir = tempdir().unwrap();
        let found = discover_candidates(dir.path(), &ScanSettings::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn filters_by_extension_recursively_in_order() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b.mp4"));
        touch(&dir.path().join("a.MP4"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("show/s01/e02.mp4"));
        touch(&dir.path().join("show/s01/e01.mp4"));
        touch(&dir.path().join("show/cover.jpg"));
        touch(&dir.path().join("movie.mkv"));

        let found = discover_candidates(dir.path(), &ScanSettings::default()).unwrap();
        assert_eq!(
            names(&found),
            vec!["a.MP4", "b.mp4", "show/s01/e01.mp4", "show/s01/e02.mp4"]
        );
        assert!(found.iter().all(|c| c.path.starts_with(dir.path())));
    }

    #[test]
    fn skips_prior_outputs_and_partials() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("video.mp4"));
        touch(&dir.path().join("video.remux.mp4"));
        touch(&dir.path().join(".video.remux.123.partial"));

        let found = discover_candidates(dir.path(), &ScanSettings::default()).unwrap();
        assert_eq!(names(&found), vec!["video.mp4"]);
    }

    #[test]
    fn extra_extensions_can_be_configured() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.mp4"));
        touch(&dir.path().join("b.m4v"));

        let scan = ScanSettings {
            extensions: vec!["mp4".into(), "m4v".into()],
            ..Default::default()
        };
        let found = discover_candidates(dir.path(), &scan).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn directories_named_like_videos_are_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("folder.mp4")).unwrap();
        touch(&dir.path().join("folder.mp4/inner.mp4"));

        let found = discover_candidates(dir.path(), &ScanSettings::default()).unwrap();
        assert_eq!(names(&found), vec!["folder.mp4/inner.mp4"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_tree_is_fatal() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("show/e01.mp4"));
        std::os::unix::fs::symlink(dir.path().join("show"), dir.path().join("show/again"))
            .unwrap();

        let scan = ScanSettings {
            follow_links: true,
            ..Default::default()
        };
        let err = discover_candidates(dir.path(), &scan).unwrap_err();
        match err {
            RunError::Path { path, .. } => assert!(path.starts_with(dir.path())),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_not_followed_by_default() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("show/e01.mp4"));
        std::os::unix::fs::symlink(dir.path().join("show"), dir.path().join("show/again"))
            .unwrap();

        let found = discover_candidates(dir.path(), &ScanSettings::default()).unwrap();
        assert_eq!(names(&found), vec!["show/e01.mp4"]);
    }
}
