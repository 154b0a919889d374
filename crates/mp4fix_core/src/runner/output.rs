//! Output path derivation and publication.
//!
//! Outputs are named `<stem><marker>.<ext>` and live next to the source, or
//! at the same relative path under an output root. ffmpeg writes to a
//! hidden `.partial` file in the same directory which is only moved to the
//! final name once it is known to be good, and never over an existing file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::discovery::Candidate;

/// Final output path for `candidate`.
///
/// Returns `None` if the candidate has no file stem or the derived path
/// would be the candidate itself.
pub fn output_path(
    candidate: &Candidate,
    marker: &str,
    output_root: Option<&Path>,
) -> Option<PathBuf> {
    let stem = candidate.path.file_stem()?.to_string_lossy();
    let name = match candidate.path.extension() {
        Some(ext) => format!("{}{}.{}", stem, marker, ext.to_string_lossy()),
        None => format!("{}{}", stem, marker),
    };

    let dir = match output_root {
        Some(root) => match candidate.relative.parent() {
            Some(parent) => root.join(parent),
            None => root.to_path_buf(),
        },
        None => candidate.path.parent()?.to_path_buf(),
    };

    let output = dir.join(name);
    if output == candidate.path {
        return None;
    }
    Some(output)
}

/// Hidden temp path ffmpeg writes to before publication.
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!(".{}.{}.partial", stem, std::process::id());
    match output.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Whether anything (file, dir or dangling link) exists at `path`.
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Result of moving a finished partial file into place.
#[derive(Debug, PartialEq, Eq)]
pub enum Publish {
    /// The output now exists.
    Published,
    /// Something appeared at the output path meanwhile; partial discarded.
    Collision,
}

/// Move `partial` to `output` without replacing an existing file.
///
/// Uses a hard link where the filesystem supports it so the no-clobber
/// check is atomic, falling back to check-then-rename otherwise.
pub fn publish(partial: &Path, output: &Path) -> io::Result<Publish> {
    match fs::hard_link(partial, output) {
        Ok(()) => {
            // the output is in place; a leftover partial is only noise
            discard(partial);
            Ok(Publish::Published)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            discard(partial);
            Ok(Publish::Collision)
        }
        Err(e) => {
            tracing::debug!("hard link unavailable ({}), falling back to rename", e);
            if path_exists(output) {
                discard(partial);
                return Ok(Publish::Collision);
            }
            fs::rename(partial, output)?;
            Ok(Publish::Published)
        }
    }
}

/// Remove a partial file, ignoring "not found".
pub fn discard(partial: &Path) {
    if let Err(e) = fs::remove_file(partial) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", partial.display(), e);
        }
    }
}
