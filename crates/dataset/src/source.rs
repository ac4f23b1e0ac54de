//! Locating the database exports.
//!
//! e621 publishes dated dumps named `posts-YYYY-MM-DD.csv.gz` and
//! `tags-YYYY-MM-DD.csv.gz`. Fetching them over the network is left to the
//! caller; [`DumpDirectory`] covers the case where they have already been
//! downloaded into a local directory.

use crate::compression::Compression;
use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static EXPORT_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(posts|tags)-(\d{4}-\d{2}-\d{2})\.csv(\.(?:gz|bz2|xz|zst))?$").unwrap());

/// The exports the pipeline consumes.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dataset {
    #[display("posts")]
    Posts,
    #[display("tags")]
    Tags,
}

impl Dataset {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "posts" => Some(Dataset::Posts),
            "tags" => Some(Dataset::Tags),
            _ => None,
        }
    }
}

/// A dated export file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub dataset: Dataset,
    /// Export date as `YYYY-MM-DD`; sorts chronologically as a string.
    pub date: String,
    pub path: PathBuf,
}

impl Export {
    /// Recognise an export from its file name.
    ///
    /// Exports compressed in a format this build cannot decode are ignored.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?;
        let captures = EXPORT_FILENAME.captures(name)?;
        if captures.get(3).is_some() && Compression::from_path(&path) == Compression::None {
            tracing::debug!(path = %path.display(), "Skipping export in unsupported compression format");
            return None;
        }
        let dataset = Dataset::from_prefix(captures.get(1)?.as_str())?;
        let date = captures.get(2)?.as_str().to_string();
        Some(Self { dataset, date, path })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Where the latest exports come from, and how to get a local copy.
pub trait ExportSource {
    /// The most recent export of each dataset the source knows about.
    fn latest_exports(&self) -> Result<BTreeMap<Dataset, Export>>;

    /// Make the export available inside `destination` (a directory),
    /// returning the local path.
    fn retrieve(&self, export: &Export, destination: &Path) -> Result<PathBuf>;
}

/// A directory that dumps have been downloaded into.
#[derive(Clone, Debug)]
pub struct DumpDirectory {
    root: PathBuf,
}

impl DumpDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Latest export of one dataset, failing if there is none.
    pub fn latest(&self, dataset: Dataset) -> Result<Export> {
        match self.latest_exports()?.remove(&dataset) {
            Some(export) => Ok(export),
            None => exn::bail!(ErrorKind::NotFound(dataset, self.root.clone())),
        }
    }
}

impl ExportSource for DumpDirectory {
    fn latest_exports(&self) -> Result<BTreeMap<Dataset, Export>> {
        let entries = fs::read_dir(&self.root).or_raise(|| ErrorKind::Open(self.root.clone()))?;
        let mut latest: BTreeMap<Dataset, Export> = BTreeMap::new();
        for entry in entries {
            let entry = entry.or_raise(|| ErrorKind::Open(self.root.clone()))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(export) = Export::from_path(entry.path()) else {
                continue;
            };
            // Same-day exports with different compression are ordered by file
            // name so the choice doesn't depend on directory iteration order.
            let newer = latest
                .get(&export.dataset)
                .is_none_or(|current| (&export.date, &export.path) > (&current.date, &current.path));
            if newer {
                latest.insert(export.dataset, export);
            }
        }
        for export in latest.values() {
            tracing::debug!(dataset = %export.dataset, date = %export.date, path = %export.path.display(), "Found export");
        }
        Ok(latest)
    }

    fn retrieve(&self, export: &Export, destination: &Path) -> Result<PathBuf> {
        let name = export.file_name().ok_or_raise(|| ErrorKind::Retrieve(export.path.clone()))?;
        let target = destination.join(name);
        if target.is_file() {
            tracing::info!(path = %target.display(), "Export already retrieved");
            return Ok(target);
        }
        fs::create_dir_all(destination).or_raise(|| ErrorKind::Retrieve(destination.to_path_buf()))?;
        fs::copy(&export.path, &target).or_raise(|| ErrorKind::Retrieve(target.clone()))?;
        tracing::info!(from = %export.path.display(), to = %target.display(), "Retrieved export");
        Ok(target)
    }
}
