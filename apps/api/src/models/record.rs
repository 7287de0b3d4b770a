use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Field attached to every record before it is persisted.
pub const RESUME_FILE_FIELD: &str = "resume_file";
/// Key under which the database-assigned identifier appears in exports.
pub const ID_FIELD: &str = "_id";

/// A single scalar value inside a parsed record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// Value of one extracted field. `Missing` serializes as `null` and covers
/// fields the extractor knows about but found nothing for.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Missing,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

/// Wire shape accepted for a field. Anything beyond strings and numbers is
/// folded into text so one odd value never rejects the whole record.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawField {
    Missing,
    List(Vec<Option<RawScalar>>),
    Scalar(RawScalar),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Number(serde_json::Number),
    Text(String),
    Bool(bool),
    Other(serde_json::Value),
}

impl From<RawScalar> for Scalar {
    fn from(raw: RawScalar) -> Self {
        match raw {
            RawScalar::Number(n) => Scalar::Number(n),
            RawScalar::Text(s) => Scalar::Text(s),
            RawScalar::Bool(b) => Scalar::Text(b.to_string()),
            RawScalar::Other(v) => Scalar::Text(v.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawField::deserialize(deserializer)? {
            RawField::Missing => FieldValue::Missing,
            // Null items carry nothing to show or export.
            RawField::List(items) => {
                FieldValue::List(items.into_iter().flatten().map(Scalar::from).collect())
            }
            RawField::Scalar(raw) => FieldValue::Scalar(raw.into()),
        })
    }
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Scalar(Scalar::Text(value.into()))
    }

    pub fn number(value: impl Into<serde_json::Number>) -> Self {
        FieldValue::Scalar(Scalar::Number(value.into()))
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Human-readable rendering: lists are joined with `", "`, missing values are empty.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Missing => String::new(),
            FieldValue::Scalar(s) => s.to_string(),
            FieldValue::List(items) => items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Schema-less mapping of field name to value, as returned by an extractor.
/// Fields keep the order the extractor produced them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedRecord(IndexMap<String, FieldValue>);

impl ParsedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) {
        self.0.insert(key.into(), value);
    }

    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Returns a copy with the originating file name attached under `resume_file`.
    pub fn with_source_file(&self, file_name: &str) -> Self {
        self.clone()
            .with(RESUME_FILE_FIELD, FieldValue::text(file_name))
    }
}

impl FromIterator<(String, FieldValue)> for ParsedRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        ParsedRecord(iter.into_iter().collect())
    }
}

/// A persisted record together with its database-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: Uuid,
    pub record: ParsedRecord,
}

/// Label used when rendering a field: first letter upper-cased, the rest
/// lower-cased, underscores replaced with spaces (`mobile_number` → `Mobile number`).
pub fn display_label(key: &str) -> String {
    let mut chars = key.chars();
    let capitalized = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect::<String>(),
        None => String::new(),
    };
    capitalized.replace('_', " ")
}
