//! Cross-referencing fingerprints with the posts export.

use e621_dataset::{ArtistTagSet, DatasetIndex, PostRecord, Value, is_excluded};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Base of every derived `post_url`.
pub const POST_URL_PREFIX: &str = "https://e621.net/posts/";
/// Suffix e621 appends to artist tags that collide with other tag names.
pub const ARTIST_SUFFIX: &str = "_(artist)";

const POST_URL: &str = "post_url";
const ARTIST_STRING: &str = "artist_string";

/// A matched post plus the fields derived from it.
///
/// `artist_string` is `None` only when matching ran without an
/// [`ArtistTagSet`]; with one, a post without artists gets an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    post: PostRecord,
    post_url: Value,
    artist_string: Option<Value>,
}

impl EnrichedRecord {
    pub fn new(post: PostRecord, artists: Option<&ArtistTagSet>) -> Self {
        let id = post.get("id").map(ToString::to_string).unwrap_or_default();
        let post_url = Value::Text(format!("{POST_URL_PREFIX}{id}"));
        let artist_string = artists.map(|artists| Value::Text(artist_string(post.tag_string(), artists)));
        Self { post, post_url, artist_string }
    }

    pub fn post(&self) -> &PostRecord {
        &self.post
    }

    pub fn id(&self) -> Option<i64> {
        self.post.id()
    }

    pub fn md5(&self) -> &str {
        self.post.md5()
    }

    pub fn post_url(&self) -> &str {
        self.post_url.as_str().unwrap_or_default()
    }

    pub fn artist_string(&self) -> Option<&str> {
        self.artist_string.as_ref().and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        match field {
            POST_URL => Some(&self.post_url),
            ARTIST_STRING => self.artist_string.as_ref(),
            _ => self.post.get(field),
        }
    }

    /// Every field in output order: the export's columns, then the derived
    /// fields. Derived fields replace export columns of the same name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.post
            .fields()
            .filter(|(name, _)| *name != POST_URL && *name != ARTIST_STRING)
            .chain(std::iter::once((POST_URL, &self.post_url)))
            .chain(self.artist_string.as_ref().map(|artists| (ARTIST_STRING, artists)))
    }
}

impl Serialize for EnrichedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Space-joined artist names from a whitespace separated tag string, with the
/// `_(artist)` suffix removed. Tags that reduce to an excluded name once the
/// suffix is gone are dropped, as are the (malformed) tags that still contain
/// `_(artist)` somewhere else.
pub fn artist_string(tag_string: &str, artists: &ArtistTagSet) -> String {
    tag_string
        .split_whitespace()
        .filter(|tag| artists.contains(tag))
        .map(|tag| tag.strip_suffix(ARTIST_SUFFIX).unwrap_or(tag))
        .filter(|name| !name.is_empty() && !name.contains(ARTIST_SUFFIX) && !is_excluded(name))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up a fingerprint and enrich the post it belongs to.
///
/// A miss is the common case for an arbitrary directory and is not an error.
pub fn match_fingerprint(
    fingerprint: &str,
    posts: &DatasetIndex,
    artists: Option<&ArtistTagSet>,
) -> Option<EnrichedRecord> {
    posts.get(fingerprint).map(|post| EnrichedRecord::new(post.clone(), artists))
}
