//! The posts export, indexed by MD5.

use crate::compression::open;
use crate::error::{ErrorKind, Result};
use crate::record::{Columns, PostRecord, REQUIRED_COLUMNS, TEXT_COLUMNS, Value};
use exn::{OptionExt, ResultExt};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Lookup from file fingerprint to the post it belongs to.
///
/// When the export contains the same MD5 more than once, the **first** row
/// is kept and every later row is counted in [`duplicates`](Self::duplicates).
/// Rows with an empty `md5` cell are skipped.
#[derive(Debug, Default)]
pub struct DatasetIndex {
    records: HashMap<String, PostRecord>,
    duplicates: usize,
}

impl DatasetIndex {
    /// Load a (possibly compressed) posts export from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let index = Self::from_reader(open(path)?).or_raise(|| ErrorKind::Load(path.to_path_buf()))?;
        tracing::info!(posts = index.len(), duplicates = index.duplicates, "Loaded posts export");
        Ok(index)
    }

    /// Build the index from uncompressed CSV.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let columns = Arc::new(Columns::new(reader.headers().or_raise(|| ErrorKind::Parse)?.iter()));
        for name in REQUIRED_COLUMNS {
            if columns.position(name).is_none() {
                exn::bail!(ErrorKind::MissingColumn(name));
            }
        }
        let md5 = columns.position("md5").ok_or_raise(|| ErrorKind::MissingColumn("md5"))?;
        let text: Vec<bool> = columns.names().iter().map(|name| TEXT_COLUMNS.contains(&name.as_str())).collect();

        let mut index = Self::default();
        let mut row = csv::StringRecord::new();
        while reader.read_record(&mut row).or_raise(|| ErrorKind::Parse)? {
            let fingerprint = row.get(md5).unwrap_or_default().trim().to_ascii_lowercase();
            if fingerprint.is_empty() {
                continue;
            }
            match index.records.entry(fingerprint) {
                Entry::Occupied(existing) => {
                    index.duplicates += 1;
                    tracing::debug!(
                        md5 = %existing.key(),
                        line = ?row.position().map(|p| p.line()),
                        "Duplicate fingerprint in posts export; keeping first row"
                    );
                },
                Entry::Vacant(slot) => {
                    let values = row.iter().zip(&text).map(|(raw, &text)| {
                        if text { Value::Text(raw.to_string()) } else { Value::infer(raw) }
                    });
                    slot.insert(PostRecord::new(Arc::clone(&columns), values));
                },
            }
        }
        Ok(index)
    }

    /// Look up a post by lowercase hex MD5.
    pub fn get(&self, fingerprint: &str) -> Option<&PostRecord> {
        self.records.get(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of rows discarded because their MD5 was already indexed.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use rstest::rstest;
    use std::io::Write;

    const EXPORT: &str = "\
id,created_at,md5,rating,tag_string,score
42,2024-01-01 10:00:00,5d41402abc4b2a76b9719d911017c592,s,red_panda john_doe_(artist),17
7,2023-05-05 12:00:00,7D793037A0760186574B0282F2F435E7,e,\"wolf, grey\",0
";

    #[test]
    fn test_from_reader() {
        let index = DatasetIndex::from_reader(EXPORT.as_bytes()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.duplicates(), 0);
        let post = index.get("5d41402abc4b2a76b9719d911017c592").unwrap();
        assert_eq!(post.id(), Some(42));
        assert_eq!(post.tag_string(), "red_panda john_doe_(artist)");
        assert_eq!(post.get("score"), Some(&Value::Integer(17)));
        assert_eq!(post.get("rating"), Some(&Value::from("s")));
        assert!(index.get("0000").is_none());
    }

    #[test]
    fn test_fingerprints_are_lowercased() {
        let index = DatasetIndex::from_reader(EXPORT.as_bytes()).unwrap();
        let post = index.get("7d793037a0760186574b0282f2f435e7").unwrap();
        assert_eq!(post.id(), Some(7));
        // The stored cell is passed through untouched.
        assert_eq!(post.md5(), "7D793037A0760186574B0282F2F435E7");
        assert_eq!(post.tag_string(), "wolf, grey");
    }

    #[test]
    fn test_duplicate_fingerprint_keeps_first_row() {
        let export = "id,md5,tag_string\n1,abc,first\n2,abc,second\n3,ABC,third\n";
        let index = DatasetIndex::from_reader(export.as_bytes()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.duplicates(), 2);
        let post = index.get("abc").unwrap();
        assert_eq!(post.id(), Some(1));
        assert_eq!(post.tag_string(), "first");
    }

    #[test]
    fn test_empty_md5_rows_are_skipped() {
        let export = "id,md5,tag_string\n1,,deleted\n2,def,kept\n";
        let index = DatasetIndex::from_reader(export.as_bytes()).unwrap();
        assert_eq!(index.len(), 1);
        assert!(index.get("def").is_some());
    }

    #[test]
    fn test_numeric_looking_tag_string_stays_text() {
        let export = "id,md5,tag_string\n1,123,2024\n";
        let index = DatasetIndex::from_reader(export.as_bytes()).unwrap();
        let post = index.get("123").unwrap();
        assert_eq!(post.get("md5"), Some(&Value::from("123")));
        assert_eq!(post.get("tag_string"), Some(&Value::from("2024")));
    }

    #[rstest]
    #[case("id,tag_string\n1,a\n", "md5")]
    #[case("md5,tag_string\nabc,a\n", "id")]
    #[case("id,md5\n1,abc\n", "tag_string")]
    #[case("", "id")]
    fn test_missing_required_column(#[case] export: &str, #[case] column: &str) {
        let err = DatasetIndex::from_reader(export.as_bytes()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingColumn(c) if *c == column));
    }

    #[test]
    fn test_ragged_row_is_fatal() {
        let export = "id,md5,tag_string\n1,abc,a\n2,def\n";
        let err = DatasetIndex::from_reader(export.as_bytes()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Parse));
    }

    #[test]
    fn test_load_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts-2024-01-01.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(EXPORT.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();
        let index = DatasetIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_load_corrupt_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv.gz");
        std::fs::write(&path, [0x1F, 0x8B, 0x08, 0x00, 0xFF, 0xFF, 0xFF]).unwrap();
        let err = DatasetIndex::load(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load(p) if p == &path));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv.gz");
        let err = DatasetIndex::load(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Open(_)));
    }
}
