//! Basename resolution
//!
//! Finds a sibling file when only the stem of a path is known, e.g.
//! `icons/play` resolving to `icons/play.png`.

use std::fs;
use std::path::{Path, PathBuf};

/// First file in `path`'s directory whose name starts with `path`'s file
/// name. Entries are compared in sorted order so the pick is stable across
/// platforms.
///
/// Returns `None` when the directory cannot be read or nothing matches.
pub fn resolve_by_basename(path: &Path) -> Option<PathBuf> {
    let prefix = path.file_name()?.to_str()?;
    let directory = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot scan {} for {}: {}", directory.display(), prefix, e);
            return None;
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(prefix))
        .collect();
    names.sort();

    let resolved = directory.join(names.into_iter().next()?);
    tracing::debug!("Resolved {} -> {}", path.display(), resolved.display());
    Some(resolved)
}
