//! The tags export, reduced to the set of artist tags.

use crate::compression::open;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::instrument;

/// Tag category e621 uses for artists.
pub const ARTIST_CATEGORY: i64 = 1;

/// Artist-category tags that describe posting policy or warnings rather than
/// an actual artist.
pub const EXCLUDED_ARTIST_TAGS: [&str; 8] = [
    "avoid_posting",
    "conditional_dnp",
    "epilepsy_warning",
    "jumpscare_warning",
    "motion_sickness_warning",
    "sound_warning",
    "third-party_edit",
    "unknown_artist",
];

pub fn is_excluded(tag: &str) -> bool {
    EXCLUDED_ARTIST_TAGS.contains(&tag)
}

/// Names of every artist tag, minus [`EXCLUDED_ARTIST_TAGS`].
///
/// Names are stored exactly as exported, so they keep any `_(artist)` suffix.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArtistTagSet {
    names: HashSet<String>,
}

impl ArtistTagSet {
    /// Load a (possibly compressed) tags export from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tags = Self::from_reader(open(path)?).or_raise(|| ErrorKind::Load(path.to_path_buf()))?;
        tracing::info!(artists = tags.len(), "Loaded tags export");
        Ok(tags)
    }

    /// Build the set from uncompressed CSV with at least `name` and
    /// `category` columns.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers().or_raise(|| ErrorKind::Parse)?;
        let name = headers.iter().position(|h| h == "name").ok_or_raise(|| ErrorKind::MissingColumn("name"))?;
        let category =
            headers.iter().position(|h| h == "category").ok_or_raise(|| ErrorKind::MissingColumn("category"))?;

        let mut names = HashSet::new();
        let mut row = csv::StringRecord::new();
        while reader.read_record(&mut row).or_raise(|| ErrorKind::Parse)? {
            let raw = row.get(category).unwrap_or_default().trim();
            let parsed = raw.parse::<i64>().or_raise(|| ErrorKind::InvalidValue {
                column: "category",
                line: row.position().map(|p| p.line()).unwrap_or_default(),
                value: raw.to_string(),
            })?;
            if parsed != ARTIST_CATEGORY {
                continue;
            }
            let tag = row.get(name).unwrap_or_default();
            if !tag.is_empty() && !is_excluded(tag) {
                names.insert(tag.to_string());
            }
        }
        Ok(Self { names })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.names.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Collect artist tag names directly; excluded names are dropped.
impl<S: Into<String>> FromIterator<S> for ArtistTagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names = iter.into_iter().map(Into::into).filter(|name: &String| !is_excluded(name)).collect();
        Self { names }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EXPORT: &str = "\
id,name,category,post_count
1,john_doe_(artist),1,10
2,red_panda,5,9000
3,conditional_dnp,1,500
4,jane,1,3
5,conditional_dnp_fan,0,1
6,unknown_artist,1,2000
";

    #[test]
    fn test_from_reader_keeps_artists() {
        let tags = ArtistTagSet::from_reader(EXPORT.as_bytes()).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("john_doe_(artist)"));
        assert!(tags.contains("jane"));
        assert!(!tags.contains("red_panda"));
        assert!(!tags.contains("john_doe"));
    }

    #[rstest]
    #[case("avoid_posting")]
    #[case("conditional_dnp")]
    #[case("epilepsy_warning")]
    #[case("jumpscare_warning")]
    #[case("motion_sickness_warning")]
    #[case("sound_warning")]
    #[case("third-party_edit")]
    #[case("unknown_artist")]
    fn test_excluded_tags(#[case] tag: &str) {
        let export = format!("name,category\n{tag},1\n");
        let tags = ArtistTagSet::from_reader(export.as_bytes()).unwrap();
        assert!(!tags.contains(tag));
        assert!(tags.is_empty());
        assert!(is_excluded(tag));
    }

    #[test]
    fn test_from_iter_applies_exclusions() {
        let tags: ArtistTagSet = ["john_doe_(artist)", "sound_warning"].into_iter().collect();
        assert_eq!(tags.len(), 1);
        assert!(tags.contains("john_doe_(artist)"));
    }

    #[rstest]
    #[case("id,category\n1,1\n", "name")]
    #[case("id,name\n1,jane\n", "category")]
    fn test_missing_required_column(#[case] export: &str, #[case] column: &str) {
        let err = ArtistTagSet::from_reader(export.as_bytes()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingColumn(c) if *c == column));
    }

    #[test]
    fn test_invalid_category_is_fatal() {
        let export = "name,category\njane,1\njohn,artist\n";
        let err = ArtistTagSet::from_reader(export.as_bytes()).unwrap_err();
        assert!(matches!(
            &*err,
            ErrorKind::InvalidValue { column: "category", line: 3, value } if value == "artist"
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtistTagSet::load(dir.path().join("tags.csv.gz")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Open(_)));
    }
}
