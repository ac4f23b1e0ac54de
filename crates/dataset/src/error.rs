//! Dataset Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Every error in this crate is fatal to a pipeline run: without both indices
//! there is nothing meaningful to match against.

use crate::source::Dataset;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A dataset error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for dataset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The export file could not be opened (missing, permissions).
    #[display("unable to open export: {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    /// The export could be opened but not loaded; the source of this error
    /// explains why.
    #[display("unable to load export: {}", _0.display())]
    Load(#[error(not(source))] PathBuf),
    /// Failed to initialize a decoder for the detected compression format.
    #[display("unable to initialize decoder for {_0} compressed export")]
    Decoder(#[error(not(source))] &'static str),
    /// The tabular data is corrupt or malformed (including corrupt
    /// compressed streams). Don't retry with the same input.
    #[display("malformed export data")]
    Parse,
    /// The header row lacks a column the pipeline depends on.
    #[display("export is missing required column: {_0}")]
    MissingColumn(#[error(not(source))] &'static str),
    /// A value in a column the pipeline reads could not be interpreted.
    #[display("invalid value in column '{column}' on line {line}: {value}")]
    InvalidValue {
        /// The column the value was read from.
        column: &'static str,
        /// Line number in the (decompressed) export.
        line: u64,
        /// The offending raw value.
        value: String,
    },
    /// No export for the dataset could be found in a dump directory.
    #[display("no {_0} export found in {}", _1.display())]
    NotFound(#[error(not(source))] Dataset, #[error(not(source))] PathBuf),
    /// Copying an export to its destination failed.
    #[display("unable to retrieve export into: {}", _0.display())]
    Retrieve(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Open(_) | Self::Retrieve(_))
    }
}
