//! Filesystem helpers that report failures as `internal.io_error`.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

fn io_error(operation: &str) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |e| Error::internal_io(e.to_string(), Some(operation.to_string()))
}

pub fn read_file(path: &Path, operation: &str) -> Result<String> {
    fs::read_to_string(path).map_err(io_error(operation))
}

pub fn read_bytes(path: &Path, operation: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(io_error(operation))
}

pub fn write_file(path: &Path, content: &str, operation: &str) -> Result<()> {
    fs::write(path, content).map_err(io_error(operation))
}

/// Create `path` and any missing parents.
pub fn ensure_dir(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(path).map_err(io_error(operation))
}

/// Copy `from` over `to`, returning the number of bytes written.
pub fn copy_file(from: &Path, to: &Path, operation: &str) -> Result<u64> {
    fs::copy(from, to).map_err(|e| {
        Error::internal_io(
            format!("{} -> {}: {}", from.display(), to.display(), e),
            Some(operation.to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error_with_operation() {
        let err = read_file(Path::new("/nonexistent/stagehand.json"), "read config").unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
        assert_eq!(err.details["context"], "read config");
    }

    #[test]
    fn write_into_missing_dir_fails() {
        assert!(write_file(Path::new("/nonexistent/dir/file.txt"), "x", "write").is_err());
    }

    #[test]
    fn copy_into_created_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.tgz");
        let nested = dir.path().join("repo").join("nested");
        fs::write(&src, b"payload").unwrap();

        ensure_dir(&nested, "mkdir").unwrap();
        let copied = copy_file(&src, &nested.join("a.tgz"), "copy").unwrap();

        assert_eq!(copied, 7);
        assert_eq!(read_bytes(&nested.join("a.tgz"), "read").unwrap(), b"payload");
    }
}
