use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{HotspotError, Result};

/// Every file under `root` (recursively) with the given extension, sorted.
///
/// An unreadable root is an error; unreadable entries below it are logged
/// and skipped.
pub fn discover_sources(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(HotspotError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("source folder {} is not a readable directory", root.display()),
        )));
    }
    std::fs::read_dir(root)?;

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|s| s.eq_ignore_ascii_case(extension))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}
