//! Reading candidate addresses from the input file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading the input file; all of them end the run
#[derive(Debug, Error)]
pub enum InputError {
    /// The file does not exist
    #[error("File '{}' not found.", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },
    /// The file exists but may not be read
    #[error("Permission denied when reading file '{}'.", path.display())]
    PermissionDenied {
        /// Path that was read
        path: PathBuf,
    },
    /// Any other I/O failure
    #[error("Error reading file '{}': {source}", path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Read one candidate address per line.
///
/// Lines are trimmed; blank lines and lines starting with `#` are dropped.
/// Everything else is kept as-is, validation happens per lookup.
pub fn read_ips(path: &Path) -> Result<Vec<String>, InputError> {
    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => InputError::NotFound {
            path: path.to_path_buf(),
        },
        io::ErrorKind::PermissionDenied => InputError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => InputError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    Ok(parse_ip_lines(&contents))
}

/// Extract candidate lines from file contents
pub fn parse_ip_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
