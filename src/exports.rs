//! Deciding which export files to load.

use crate::error::{ErrorKind, Result};
use e621_config::Exports;
use e621_dataset::{Dataset, Export, ExportSource};
use exn::{OptionExt, ResultExt};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub posts: PathBuf,
    /// Without a tags export, matching runs tag-unaware.
    pub tags: Option<PathBuf>,
}

/// Explicitly configured paths win; anything else comes from the latest
/// exports `source` knows about, retrieved into the cache directory first
/// when one is configured. Only the posts export is required.
pub fn resolve(exports: &Exports, source: Option<&dyn ExportSource>) -> Result<ExportPaths> {
    let mut latest = match source {
        Some(source) => source.latest_exports().or_raise(|| ErrorKind::Exports)?,
        None => Default::default(),
    };
    let local = |export: Export| -> Result<PathBuf> {
        match (source, exports.cache_directory.as_deref()) {
            (Some(source), Some(cache)) => retrieve(source, &export, cache),
            _ => Ok(export.path),
        }
    };

    let posts = match &exports.posts {
        Some(posts) => posts.clone(),
        None => local(latest.remove(&Dataset::Posts).ok_or_raise(|| ErrorKind::MissingExport(Dataset::Posts))?)?,
    };
    let tags = match &exports.tags {
        Some(tags) => Some(tags.clone()),
        None => latest.remove(&Dataset::Tags).map(&local).transpose()?,
    };
    Ok(ExportPaths { posts, tags })
}

fn retrieve(source: &dyn ExportSource, export: &Export, cache: &Path) -> Result<PathBuf> {
    tracing::info!(dataset = %export.dataset, date = %export.date, "Retrieving export");
    source.retrieve(export, cache).or_raise(|| ErrorKind::Exports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use e621_dataset::DumpDirectory;

    fn dump() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in ["posts-2024-01-01.csv.gz", "posts-2024-02-01.csv.gz", "tags-2024-01-15.csv.gz", "notes.txt"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }
        dir
    }

    #[test]
    fn test_explicit_paths_only() {
        let exports = Exports { posts: Some(PathBuf::from("posts.csv")), ..Exports::default() };
        let paths = resolve(&exports, None).unwrap();
        assert_eq!(paths, ExportPaths { posts: PathBuf::from("posts.csv"), tags: None });
    }

    #[test]
    fn test_latest_from_dump_directory() {
        let dir = dump();
        let source = DumpDirectory::new(dir.path());
        let paths = resolve(&Exports::default(), Some(&source)).unwrap();
        assert_eq!(paths.posts, dir.path().join("posts-2024-02-01.csv.gz"));
        assert_eq!(paths.tags, Some(dir.path().join("tags-2024-01-15.csv.gz")));
    }

    #[test]
    fn test_explicit_path_overrides_discovery() {
        let dir = dump();
        let source = DumpDirectory::new(dir.path());
        let exports = Exports { tags: Some(PathBuf::from("my-tags.csv")), ..Exports::default() };
        let paths = resolve(&exports, Some(&source)).unwrap();
        assert_eq!(paths.posts, dir.path().join("posts-2024-02-01.csv.gz"));
        assert_eq!(paths.tags, Some(PathBuf::from("my-tags.csv")));
    }

    #[test]
    fn test_retrieve_into_cache() {
        let dir = dump();
        let cache = tempfile::tempdir().unwrap();
        let source = DumpDirectory::new(dir.path());
        let exports = Exports { cache_directory: Some(cache.path().join("exports")), ..Exports::default() };
        let paths = resolve(&exports, Some(&source)).unwrap();
        let posts = cache.path().join("exports/posts-2024-02-01.csv.gz");
        assert_eq!(paths.posts, posts);
        assert_eq!(std::fs::read_to_string(&posts).unwrap(), "posts-2024-02-01.csv.gz");
        assert!(cache.path().join("exports/tags-2024-01-15.csv.gz").is_file());
    }

    #[test]
    fn test_missing_posts_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tags-2024-01-15.csv.gz"), b"").unwrap();
        let source = DumpDirectory::new(dir.path());
        let err = resolve(&Exports::default(), Some(&source)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingExport(Dataset::Posts)));
    }
}
