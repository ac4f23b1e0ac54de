//! Compression detection for database exports.
//!
//! The exports are published as gzipped CSV, but a cached copy may have been
//! decompressed or recompressed by the user. Detection prefers magic bytes
//! over the file extension, so a misnamed file is still read correctly.

use crate::error::{ErrorKind, Result};
use bzip2::read::MultiBzDecoder;
use exn::ResultExt;
use flate2::read::MultiGzDecoder;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::instrument;
#[cfg(feature = "xz")]
use xz2::read::XzDecoder;
#[cfg(feature = "zstd")]
use zstd::stream::read::Decoder as ZstdDecoder;

const BZIP2_MAGIC: [u8; 3] = [0x42, 0x5A, 0x68];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
#[cfg(feature = "xz")]
const XZ_MAGIC: [u8; 6] = [0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
#[cfg(feature = "zstd")]
const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// A compression format an export may be stored in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Plain CSV
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz), the format e621 publishes
    Gzip,
    /// XZ/LZMA compression (.xz)
    #[cfg(feature = "xz")]
    Xz,
    /// Zstd compression (.zst)
    #[cfg(feature = "zstd")]
    Zstd,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Bzip2 => "bzip2",
            Compression::Gzip => "gzip",
            #[cfg(feature = "xz")]
            Compression::Xz => "xz",
            #[cfg(feature = "zstd")]
            Compression::Zstd => "zstd",
        }
    }

    /// Formats this build can decode, with their file extension and leading
    /// bytes.
    const DECODABLE: &[(Compression, &'static str, &'static [u8])] = &[
        (Compression::Bzip2, "bz2", &BZIP2_MAGIC),
        (Compression::Gzip, "gz", &GZIP_MAGIC),
        #[cfg(feature = "xz")]
        (Compression::Xz, "xz", &XZ_MAGIC),
        #[cfg(feature = "zstd")]
        (Compression::Zstd, "zst", &ZSTD_MAGIC),
    ];

    /// Guess from the last extension of `path`, ignoring case. Anything
    /// unknown, including formats compiled out of this build, is plain CSV.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let Some(ext) = path.as_ref().extension().and_then(|ext| ext.to_str()) else {
            return Compression::None;
        };
        Self::DECODABLE
            .iter()
            .find(|(_, known, _)| known.eq_ignore_ascii_case(ext))
            .map_or(Compression::None, |(compression, _, _)| *compression)
    }

    /// Sniff the signature at the start of a file; short or unrecognised
    /// input is plain CSV.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        Self::DECODABLE
            .iter()
            .find(|(_, _, magic)| bytes.starts_with(magic))
            .map_or(Compression::None, |(compression, _, _)| *compression)
    }

    /// Wrap a reader with the matching decompression layer.
    ///
    /// Multi-member gzip and multi-stream bzip2 files are read to the end
    /// rather than stopping after the first member.
    pub fn wrap_reader<'a, R: Read + 'a>(&self, reader: R) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => Box::new(reader),
            Compression::Bzip2 => Box::new(MultiBzDecoder::new(reader)),
            Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
            #[cfg(feature = "xz")]
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => Box::new(ZstdDecoder::new(reader).or_raise(|| ErrorKind::Decoder(self.as_str()))?),
        })
    }
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Open an export file for reading, transparently decompressing it.
#[instrument(skip_all, fields(path = %path.display(), compression = tracing::field::Empty))]
pub fn open(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
    let mut reader = BufReader::new(file);
    let compression = {
        let head = reader.fill_buf().or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        match Compression::from_magic_bytes(head) {
            Compression::None => Compression::from_path(path),
            detected => detected,
        }
    };
    tracing::Span::current().record("compression", compression.as_str());
    compression.wrap_reader(reader)
}
