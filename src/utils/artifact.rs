//! Locating the packed artifact on disk.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{Error, Result};

/// Find the artifact named by `pattern`.
///
/// A plain path must exist as a file. A glob resolves to the most recently
/// modified matching file, so repeated packs of different versions pick the
/// latest one.
pub fn locate(pattern: &str) -> Result<PathBuf> {
    if glob::Pattern::escape(pattern) == pattern {
        let path = Path::new(pattern);
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(not_found(pattern, format!("Artifact not found: {}", pattern))
                .with_hint("Run the 'pack' step first or check artifactPath in stagehand.json"))
        };
    }

    let matches = glob::glob(pattern).map_err(|e| {
        Error::validation_invalid_argument(
            "artifactPath",
            format!("Invalid glob pattern '{}': {}", pattern, e),
            Some(pattern.to_string()),
            None,
        )
    })?;

    let newest = matches
        .flatten()
        .filter(|candidate| candidate.is_file())
        .max_by_key(|candidate| modified(candidate));

    let path = newest
        .ok_or_else(|| not_found(pattern, format!("No files match pattern: {}", pattern)))?;
    log_status!("artifact", "{} -> {}", pattern, path.display());
    Ok(path)
}

fn modified(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|meta| meta.modified()).ok()
}

fn not_found(pattern: &str, problem: String) -> Error {
    Error::validation_invalid_argument("artifactPath", problem, Some(pattern.to_string()), None)
}
