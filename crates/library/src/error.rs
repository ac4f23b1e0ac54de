//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Errors fall into two groups: per-file errors ([`ErrorKind::Fingerprint`],
//! [`ErrorKind::Walk`]) are reported by the scan and never stop it, while
//! [`ErrorKind::Write`] ends the run.

use derive_more::{Display, Error};
use std::path::{Path, PathBuf};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A file could not be read while computing its fingerprint.
    #[display("unable to fingerprint file: {}", _0.display())]
    Fingerprint(#[error(not(source))] PathBuf),
    /// A directory could not be listed during discovery.
    #[display("unable to read directory: {}", _0.display())]
    Walk(#[error(not(source))] PathBuf),
    /// An output file could not be written.
    #[display("unable to write results to: {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fingerprint(_) | Self::Walk(_))
    }

    /// The file or directory the error concerns.
    pub fn path(&self) -> &Path {
        match self {
            Self::Fingerprint(path) | Self::Walk(path) | Self::Write(path) => path,
        }
    }

    /// Whether the error belongs to a single discovered file (as opposed to a
    /// directory), so it still counts towards scan progress.
    pub fn is_file_error(&self) -> bool {
        matches!(self, Self::Fingerprint(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::Write(PathBuf::from("out/e621_metadata.csv")).to_string(),
            "unable to write results to: out/e621_metadata.csv"
        );
    }

    #[test]
    fn error_kind_classification() {
        let fingerprint = ErrorKind::Fingerprint(PathBuf::from("a.png"));
        assert!(fingerprint.is_file_error());
        assert!(fingerprint.is_retryable());
        assert_eq!(fingerprint.path(), Path::new("a.png"));
        assert!(!ErrorKind::Walk(PathBuf::from("dir")).is_file_error());
        assert!(!ErrorKind::Write(PathBuf::from("out.csv")).is_retryable());
    }
}
