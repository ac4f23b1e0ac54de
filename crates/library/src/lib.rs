//! Matching a local file collection against the e621 posts export.
//!
//! Files are discovered with [`walk`](walk::walk), fingerprinted by MD5 and
//! looked up in a [`DatasetIndex`](e621_dataset::DatasetIndex). Matches are
//! enriched with a `post_url` and an `artist_string`, then written out by
//! [`finalize`](output::finalize). The [`scan`](scan::scan) stream ties the
//! first three steps together.

pub mod error;
pub mod fingerprint;
pub mod matcher;
pub mod output;
pub mod scan;
pub mod walk;

/// Files fingerprinted at once unless configured otherwise.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 64;

pub use crate::fingerprint::{FileEntry, fingerprint};
pub use crate::matcher::{EnrichedRecord, artist_string, match_fingerprint};
pub use crate::output::{Outcome, OutputOptions, finalize};
pub use crate::scan::{Scan, ScanEvent, ScanOptions, scan, scan_file};
pub use crate::walk::walk;
