//! Recursive discovery of regular files.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry, ReadDir};

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Lazily yields every regular file below `root`, depth-first.
///
/// Symbolic links are never followed nor yielded, and special files (sockets,
/// FIFOs, devices) are ignored. Directories that vanish while walking are
/// skipped silently; any other failure to list a directory is yielded as an
/// error and the walk carries on with the next one. A missing `root` yields
/// nothing.
pub fn walk(root: impl Into<PathBuf>) -> impl Stream<Item = Result<PathBuf>> {
    let mut stack = vec![root.into()];
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        'dirs: while let Some(current) = stack.pop() {
            let mut entries = match read_dir(&current).await {
                Ok(Some(entries)) => entries,
                Ok(None) => continue 'dirs,
                Err(e) => {
                    yield Err(e);
                    continue 'dirs;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        yield Err::<PathBuf, _>(e).or_raise(|| ErrorKind::Walk(current.clone()));
                        continue 'dirs;
                    },
                };
                match process_entry(entry).await {
                    WalkEntry::File(path) => yield Ok(path),
                    WalkEntry::Descend(path) => stack.push(path),
                    WalkEntry::Skip => {},
                }
            }
        }
    })
}

async fn read_dir(path: &Path) -> Result<Option<ReadDir>> {
    match fs::read_dir(path).await {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Directory disappeared before it could be read");
            Ok(None)
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Walk(path.to_path_buf())),
    }
}

async fn process_entry(entry: DirEntry) -> WalkEntry {
    let path = entry.path();
    // Does not traverse symlinks, unlike `fs::metadata`.
    match entry.file_type().await {
        Ok(kind) if kind.is_dir() => WalkEntry::Descend(path),
        Ok(kind) if kind.is_file() => WalkEntry::File(path),
        Ok(_) => {
            tracing::trace!(path = %path.display(), "Skipping symlink or special file");
            WalkEntry::Skip
        },
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping entry that could not be inspected");
            WalkEntry::Skip
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn collect(root: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walk(root).try_collect().await.unwrap();
        files.sort();
        files
    }

    #[tokio::test]
    async fn test_walk_nested() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("a/b/c")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("top.png"), b"1").unwrap();
        std::fs::write(root.join("a/one.jpg"), b"2").unwrap();
        std::fs::write(root.join("a/b/c/deep.webm"), b"3").unwrap();

        let files = collect(root).await;
        assert_eq!(files, vec![root.join("a/b/c/deep.webm"), root.join("a/one.jpg"), root.join("top.png")]);
    }

    #[tokio::test]
    async fn test_walk_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect(dir.path()).await.is_empty());
    }

    #[tokio::test]
    async fn test_walk_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect(&dir.path().join("missing")).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_walk_skips_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("elsewhere.png"), b"x").unwrap();
        std::fs::write(root.join("real.png"), b"y").unwrap();
        std::os::unix::fs::symlink(root.join("real.png"), root.join("link.png")).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("linked_dir")).unwrap();

        let files = collect(root).await;
        assert_eq!(files, vec![root.join("real.png")]);
    }
}
