//! Recursive discovery of regular files in a package tree.

use crate::error::{Result, SealError};
use camino::{Utf8Path, Utf8PathBuf};

/// Collect every regular file below `root`, sorted by path.
///
/// Directories are descended into; symbolic links and other special entries
/// are skipped without being followed.
///
/// # Errors
///
/// Returns [`SealError::Io`] if a directory cannot be read or contains a
/// name that is not valid UTF-8.
pub fn regular_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_owned()];

    while let Some(dir) = pending.pop() {
        let entries = dir.read_dir_utf8().map_err(SealError::io("read directory", &dir))?;
        for entry in entries {
            let entry = entry.map_err(SealError::io("read directory", &dir))?;
            let file_type = entry
                .file_type()
                .map_err(SealError::io("stat", entry.path()))?;
            if file_type.is_dir() {
                pending.push(entry.path().to_owned());
            } else if file_type.is_file() {
                files.push(entry.path().to_owned());
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Return `path` relative to `root`.
///
/// # Errors
///
/// Returns [`SealError::InvalidLayout`] if `path` does not live under `root`.
pub fn relative_to<'a>(root: &Utf8Path, path: &'a Utf8Path) -> Result<&'a Utf8Path> {
    path.strip_prefix(root)
        .map_err(|_| SealError::InvalidLayout {
            reason: format!("{path} is outside the package root {root}"),
        })
}
