//! The scan pipeline: discovery, fingerprinting and matching as one stream.

mod file;
mod stream;

pub use self::file::{Scan, scan_file};
pub use self::stream::{ScanEvent, ScanOptions, scan};
