use crate::error::Result;
use crate::fingerprint::FileEntry;
use crate::matcher::{EnrichedRecord, match_fingerprint};
use e621_dataset::{ArtistTagSet, DatasetIndex};

/// The result of scanning a single file.
///
/// `record` is `None` when the file's fingerprint is not in the posts export.
#[derive(Debug, Clone)]
pub struct Scan {
    pub file: FileEntry,
    pub record: Option<EnrichedRecord>,
}

impl Scan {
    pub fn is_match(&self) -> bool {
        self.record.is_some()
    }
}

/// Fingerprints a single file and looks it up.
///
/// A file that cannot be read is an error for that file only; a file that is
/// simply not in the export is not an error.
pub async fn scan_file(
    mut file: FileEntry,
    posts: &DatasetIndex,
    artists: Option<&ArtistTagSet>,
) -> Result<Scan> {
    let record = match_fingerprint(file.fingerprint().await?, posts, artists);
    match &record {
        Some(record) => {
            tracing::debug!(path = %file.path.display(), id = ?record.id(), "Matched file to post");
        },
        None => tracing::trace!(path = %file.path.display(), fingerprint = ?file.fingerprint, "No post for file"),
    }
    Ok(Scan { file, record })
}
