//! Content fingerprints.
//!
//! The exports identify files by MD5, so that is the digest used here; it is
//! not relied upon for anything security related.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{ErrorKind as IoErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Bytes read per iteration; files are never loaded whole.
pub const CHUNK_SIZE: usize = 4096;

/// Compute the lowercase hex MD5 of a file, reading it in [`CHUNK_SIZE`] chunks.
#[instrument(level = "trace", skip_all, fields(path = %path.as_ref().display()))]
pub fn fingerprint_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let error = || ErrorKind::Fingerprint(path.to_path_buf());
    let mut file = File::open(path).or_raise(error)?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(e).or_raise(error),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compute a fingerprint on Tokio's blocking thread pool.
pub async fn fingerprint(path: impl Into<PathBuf>) -> Result<String> {
    let path = path.into();
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || fingerprint_file(task_path))
        .await
        .or_raise(|| ErrorKind::Fingerprint(path))?
}

/// A discovered file, fingerprinted on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub fingerprint: Option<String>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), fingerprint: None }
    }

    /// The file's fingerprint, computed on first use.
    pub async fn fingerprint(&mut self) -> Result<&str> {
        if self.fingerprint.is_none() {
            self.fingerprint = Some(fingerprint(self.path.clone()).await?);
        }
        Ok(self.fingerprint.as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(b"", "d41d8cd98f00b204e9800998ecf8427e")]
    #[case(b"hello", "5d41402abc4b2a76b9719d911017c592")]
    #[case(b"The quick brown fox jumps over the lazy dog", "9e107d9d372bb6826bd81d3542a419d6")]
    fn test_fingerprint_file(#[case] content: &[u8], #[case] expected: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        std::fs::write(&path, content).unwrap();
        assert_eq!(fingerprint_file(&path).unwrap(), expected);
    }

    #[test]
    fn test_fingerprint_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("large.bin");
        let content: Vec<u8> = (0..CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();
        assert_eq!(fingerprint_file(&path).unwrap(), format!("{:x}", Md5::digest(&content)));
    }

    #[test]
    fn test_fingerprint_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        let err = fingerprint_file(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Fingerprint(p) if p == &path));
    }

    #[tokio::test]
    async fn test_file_entry_fingerprint_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.bin");
        std::fs::write(&path, b"hello").unwrap();
        let mut entry = FileEntry::new(&path);
        assert_eq!(entry.fingerprint().await.unwrap(), "5d41402abc4b2a76b9719d911017c592");
        // Changing the file afterwards doesn't change the computed value.
        std::fs::remove_file(&path).unwrap();
        assert_eq!(entry.fingerprint().await.unwrap(), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(entry.fingerprint.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
    }
}
