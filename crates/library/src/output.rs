//! Writing the matched records out.

use crate::error::{ErrorKind, Result};
use crate::matcher::EnrichedRecord;
use exn::ResultExt;
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Where results go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputOptions {
    pub csv: PathBuf,
    /// Also write newline-delimited JSON next to the CSV file.
    pub json: bool,
}

impl OutputOptions {
    pub fn new(csv: impl Into<PathBuf>) -> Self {
        Self { csv: csv.into(), json: false }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// The CSV path with its extension swapped for `.json`.
    pub fn json_path(&self) -> PathBuf {
        self.csv.with_extension("json")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing matched, so nothing was written.
    NoMatches,
    Written { records: usize, csv: PathBuf, json: Option<PathBuf> },
}

/// Order by numeric post ID, then MD5. Records without a usable ID go last.
pub fn sort(records: &mut [EnrichedRecord]) {
    records.sort_by(compare);
}

fn compare(a: &EnrichedRecord, b: &EnrichedRecord) -> Ordering {
    match (a.id(), b.id()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.md5().cmp(b.md5()))
}

/// Union of every record's field names, in order of first appearance.
pub fn header(records: &[EnrichedRecord]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for record in records {
        for (name, _) in record.fields() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Sort the matches and write them out.
///
/// With no matches, no file is created (or truncated). Existing output files
/// are overwritten, and running twice over the same inputs produces identical
/// bytes. A CSV path already ending in `.json` cannot be combined with JSON
/// output, since both files would share one path.
#[instrument(skip_all, fields(records = records.len(), csv = %options.csv.display(), json = options.json))]
pub fn finalize(mut records: Vec<EnrichedRecord>, options: &OutputOptions) -> Result<Outcome> {
    if records.is_empty() {
        tracing::info!("No matches; not writing any output");
        return Ok(Outcome::NoMatches);
    }
    if options.json && options.json_path() == options.csv {
        exn::bail!(ErrorKind::Write(options.json_path()));
    }
    sort(&mut records);

    write_csv(&records, &options.csv).or_raise(|| ErrorKind::Write(options.csv.clone()))?;
    tracing::info!(path = %options.csv.display(), "Wrote CSV results");

    let json = if options.json {
        let path = options.json_path();
        write_json(&records, &path).or_raise(|| ErrorKind::Write(path.clone()))?;
        tracing::info!(path = %path.display(), "Wrote JSON results");
        Some(path)
    } else {
        None
    };

    Ok(Outcome::Written { records: records.len(), csv: options.csv.clone(), json })
}

fn write_csv(records: &[EnrichedRecord], path: &Path) -> std::result::Result<(), csv::Error> {
    let header = header(records);
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    writer.write_record(&header)?;
    for record in records {
        writer.write_record(
            header
                .iter()
                .map(|name| record.get(name).map(ToString::to_string).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(records: &[EnrichedRecord], path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}
