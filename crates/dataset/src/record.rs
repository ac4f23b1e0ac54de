//! Dynamic rows for the posts export.
//!
//! The export schema drifts between dump dates, so a row is an ordered
//! mapping of column name to [`Value`] rather than a fixed struct. Rows of one
//! export share a single [`Columns`] header.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

/// Columns the pipeline reads; an export without any of them is unusable.
pub const REQUIRED_COLUMNS: [&str; 3] = ["id", "md5", "tag_string"];
/// Columns never subjected to numeric inference.
pub(crate) const TEXT_COLUMNS: [&str; 2] = ["md5", "tag_string"];

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infer the type of a raw CSV cell.
    ///
    /// Numbers are only recognised in their canonical rendering (no leading
    /// zeros, signs or trailing zeros), so that writing the value back out
    /// reproduces the source text exactly.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(integer) = raw.parse::<i64>()
            && integer.to_string() == raw
        {
            return Value::Integer(integer);
        }
        if let Ok(float) = raw.parse::<f64>()
            && float.is_finite()
            && float.to_string() == raw
        {
            return Value::Float(float);
        }
        Value::Text(raw.to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(integer) => Some(*integer),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Value::Null => Ok(()),
            Value::Integer(integer) => write!(f, "{integer}"),
            Value::Float(float) => write!(f, "{float}"),
            Value::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

/// The header row of an export.
#[derive(Debug, PartialEq, Eq)]
pub struct Columns {
    names: Box<[String]>,
    positions: HashMap<String, usize>,
}

impl Columns {
    /// Repeated names resolve to their first position.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        let names: Box<[String]> = names.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            positions.entry(name.clone()).or_insert(position);
        }
        Self { names, positions }
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One row of the posts export.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    columns: Arc<Columns>,
    values: Box<[Value]>,
}

impl PostRecord {
    /// Missing trailing values are treated as [`Value::Null`]; surplus values
    /// are dropped.
    pub fn new(columns: Arc<Columns>, values: impl IntoIterator<Item = Value>) -> Self {
        let mut values: Vec<Value> = values.into_iter().take(columns.len()).collect();
        values.resize(columns.len(), Value::Null);
        Self { columns, values: values.into_boxed_slice() }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.position(column).and_then(|position| self.values.get(position))
    }

    /// The post ID, if the cell holds an integer.
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(Value::as_i64)
    }

    pub fn md5(&self) -> &str {
        self.get("md5").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn tag_string(&self) -> &str {
        self.get("tag_string").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    /// Iterate over `(column, value)` pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.names().iter().map(String::as_str).zip(self.values.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Value::Null)]
    #[case("42", Value::Integer(42))]
    #[case("-7", Value::Integer(-7))]
    #[case("0.5", Value::Float(0.5))]
    #[case("007", Value::Text("007".into()))]
    #[case("+5", Value::Text("+5".into()))]
    #[case("1.50", Value::Text("1.50".into()))]
    #[case("NaN", Value::Text("NaN".into()))]
    #[case("inf", Value::Text("inf".into()))]
    #[case("2024-01-01 10:00:00.123", Value::Text("2024-01-01 10:00:00.123".into()))]
    #[case("5d41402abc4b2a76b9719d911017c592", Value::Text("5d41402abc4b2a76b9719d911017c592".into()))]
    fn test_infer(#[case] raw: &str, #[case] expected: Value) {
        let value = Value::infer(raw);
        assert_eq!(value, expected);
        assert_eq!(value.to_string(), raw);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let values = vec![Value::Null, Value::Integer(1), Value::Float(0.5), Value::from("a")];
        assert_eq!(serde_json::to_string(&values).unwrap(), r#"[null,1,0.5,"a"]"#);
    }

    #[test]
    fn test_columns_first_position_wins() {
        let columns = Columns::new(["id", "md5", "id"]);
        assert_eq!(columns.position("id"), Some(0));
        assert_eq!(columns.position("md5"), Some(1));
        assert_eq!(columns.position("missing"), None);
        assert_eq!(columns.len(), 3);
    }

    #[test]
    fn test_record_accessors() {
        let columns = Arc::new(Columns::new(["id", "md5", "tag_string", "rating"]));
        let record = PostRecord::new(
            columns,
            [Value::Integer(42), Value::from("abc"), Value::from("a b"), Value::from("s")],
        );
        assert_eq!(record.id(), Some(42));
        assert_eq!(record.md5(), "abc");
        assert_eq!(record.tag_string(), "a b");
        assert_eq!(record.get("rating"), Some(&Value::from("s")));
        assert_eq!(record.get("score"), None);
        let names: Vec<&str> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, ["id", "md5", "tag_string", "rating"]);
    }

    #[test]
    fn test_record_pads_missing_values() {
        let columns = Arc::new(Columns::new(["id", "md5", "tag_string"]));
        let record = PostRecord::new(columns, [Value::Integer(1)]);
        assert_eq!(record.md5(), "");
        assert_eq!(record.get("tag_string"), Some(&Value::Null));
    }

    #[test]
    fn test_record_id_from_text() {
        let columns = Arc::new(Columns::new(["id"]));
        let record = PostRecord::new(columns.clone(), [Value::from(" 12 ")]);
        assert_eq!(record.id(), Some(12));
        let record = PostRecord::new(columns, [Value::from("twelve")]);
        assert_eq!(record.id(), None);
    }
}
