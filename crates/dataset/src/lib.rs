//! Loading of the e621 database exports.
//!
//! Two exports are involved:
//!
//! - **posts**: one row per post, indexed by MD5 in a [`DatasetIndex`]. Rows
//!   are kept as dynamic [`PostRecord`]s so every column of the export is
//!   passed through, whatever the export date's schema looks like.
//! - **tags**: reduced to the [`ArtistTagSet`], the names of all artist-category
//!   tags minus a fixed list of meta tags.
//!
//! Both loaders accept plain, gzip or bzip2 CSV (xz and zstd behind features)
//! and treat every failure as fatal.

mod compression;
pub mod error;
mod posts;
mod record;
mod source;
mod tags;

pub use crate::compression::{Compression, open};
pub use crate::posts::DatasetIndex;
pub use crate::record::{Columns, PostRecord, REQUIRED_COLUMNS, Value};
pub use crate::source::{Dataset, DumpDirectory, Export, ExportSource};
pub use crate::tags::{ARTIST_CATEGORY, ArtistTagSet, EXCLUDED_ARTIST_TAGS, is_excluded};
