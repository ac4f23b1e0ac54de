use crate::DEFAULT_SCAN_CONCURRENCY;
use crate::error::Result;
use crate::fingerprint::FileEntry;
use crate::matcher::EnrichedRecord;
use crate::scan::file::{Scan, scan_file};
use crate::walk::walk;
use async_stream::stream;
use e621_dataset::{ArtistTagSet, DatasetIndex};
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum number of files fingerprinted at once. Zero is treated as one.
    pub concurrency: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { concurrency: DEFAULT_SCAN_CONCURRENCY }
    }
}

/// Progress events emitted by [`scan`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of files found.
/// 3. One [`Matched`](Self::Matched) or [`Unmatched`](Self::Unmatched) per
///    file, in completion order.
/// 4. [`Complete`](Self::Complete) exactly once.
///
/// Errors are interleaved as `Err` items and never end the stream. A
/// [`Fingerprint`](crate::error::ErrorKind::Fingerprint) error takes the
/// place of the event for that file.
#[derive(Debug)]
pub enum ScanEvent {
    Started,
    DiscoveryComplete(u64),
    Matched { path: PathBuf, record: Box<EnrichedRecord> },
    Unmatched { path: PathBuf, fingerprint: String },
    Complete,
}

impl From<Scan> for ScanEvent {
    fn from(scan: Scan) -> Self {
        let Scan { file, record } = scan;
        match record {
            Some(record) => Self::Matched { path: file.path, record: Box::new(record) },
            None => Self::Unmatched { path: file.path, fingerprint: file.fingerprint.unwrap_or_default() },
        }
    }
}

/// Streams [`ScanEvent`]s for every regular file below `root`.
///
/// The whole tree is walked before any file is read so the total is known
/// up front. Files are then fingerprinted and matched against `posts` with
/// at most [`ScanOptions::concurrency`] in flight, promoting the next file as
/// each one completes.
pub fn scan<'a>(
    root: impl Into<PathBuf>,
    posts: &'a DatasetIndex,
    artists: Option<&'a ArtistTagSet>,
    options: ScanOptions,
) -> impl Stream<Item = Result<ScanEvent>> + 'a {
    let root = root.into();
    let concurrency = options.concurrency.max(1);
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(ScanEvent::Started);

        let mut files = Vec::new();
        for await path in walk(root) {
            match path {
                Ok(path) => files.push(FileEntry::new(path)),
                Err(e) => yield Err(e),
            }
        }
        // A usize (either 32- or 64-bit) always fits in a u64.
        yield Ok(ScanEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(u64::MAX)));

        let mut pending = files.into_iter().map(|file| scan_file(file, posts, artists));
        let mut processing: FuturesUnordered<_> = pending.by_ref().take(concurrency).collect();
        while let Some(result) = processing.next().await {
            yield result.map(ScanEvent::from);
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }

        yield Ok(ScanEvent::Complete);
    })
}
