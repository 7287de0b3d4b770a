use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::models::record::{StoredRecord, ID_FIELD};
use crate::storage::{ResumeStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "resumes.json",
            ExportFormat::Csv => "resumes.csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not read stored resumes: {0}")]
    Store(#[from] StoreError),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct ExportFile {
    pub format: ExportFormat,
    pub body: Vec<u8>,
}

#[derive(Debug)]
pub enum ExportOutcome {
    /// The collection holds no records; reported as a warning, no file is produced.
    Empty,
    File(ExportFile),
}

/// Reads every stored record and serializes it in `format`.
pub async fn export_all(
    store: &dyn ResumeStore,
    format: ExportFormat,
) -> Result<ExportOutcome, ExportError> {
    let records = store.find_all().await?;
    if records.is_empty() {
        return Ok(ExportOutcome::Empty);
    }

    let body = match format {
        ExportFormat::Json => to_json(&records)?,
        ExportFormat::Csv => to_csv(&records)?,
    };
    info!(
        "Exported {} resume(s) as {} ({} bytes)",
        records.len(),
        format.label(),
        body.len()
    );
    Ok(ExportOutcome::File(ExportFile { format, body }))
}

/// Array of objects; the identifier is emitted as a string under `_id`.
pub fn to_json(records: &[StoredRecord]) -> Result<Vec<u8>, ExportError> {
    let documents = records
        .iter()
        .map(|stored| {
            let mut object = Map::new();
            for (key, value) in stored.record.iter() {
                object.insert(key.clone(), serde_json::to_value(value)?);
            }
            object.insert(ID_FIELD.to_string(), Value::String(stored.id.to_string()));
            Ok::<_, serde_json::Error>(Value::Object(object))
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;
    Ok(serde_json::to_vec(&documents)?)
}

/// Columns are the union of keys in first-seen order, without `_id`.
/// Missing fields are empty cells; lists are joined with `", "`.
pub fn to_csv(records: &[StoredRecord]) -> Result<Vec<u8>, ExportError> {
    let mut seen = HashSet::new();
    let columns: Vec<&str> = records
        .iter()
        .flat_map(|stored| stored.record.keys())
        .map(String::as_str)
        .filter(|key| *key != ID_FIELD && seen.insert(*key))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for stored in records {
        writer.write_record(columns.iter().map(|column| {
            stored
                .record
                .get(column)
                .map(|value| value.display())
                .unwrap_or_default()
        }))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{FieldValue, ParsedRecord};
    use crate::storage::MemoryResumeStore;
    use uuid::Uuid;

    fn stored(record: ParsedRecord) -> StoredRecord {
        StoredRecord {
            id: Uuid::new_v4(),
            record,
        }
    }

    fn alice() -> ParsedRecord {
        ParsedRecord::new()
            .with("name", FieldValue::text("Alice"))
            .with("skills", FieldValue::list(["Go", "SQL"]))
            .with("resume_file", FieldValue::text("alice.pdf"))
    }

    #[tokio::test]
    async fn test_empty_collection_is_a_warning_not_a_file() {
        let store = MemoryResumeStore::new();
        for format in [ExportFormat::Json, ExportFormat::Csv] {
            let outcome = export_all(&store, format).await.unwrap();
            assert!(matches!(outcome, ExportOutcome::Empty));
        }
    }

    #[tokio::test]
    async fn test_export_all_produces_requested_format() {
        let store = MemoryResumeStore::new();
        store.insert_one(&alice()).await.unwrap();

        let ExportOutcome::File(file) = export_all(&store, ExportFormat::Csv).await.unwrap() else {
            panic!("expected a file");
        };
        assert_eq!(file.format.file_name(), "resumes.csv");
        assert_eq!(file.format.content_type(), "text/csv");
        assert!(String::from_utf8(file.body).unwrap().starts_with("name,"));
    }

    #[test]
    fn test_json_keeps_every_field_and_stringifies_id() {
        let record = stored(alice());
        let body = to_json(std::slice::from_ref(&record)).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&body).unwrap();

        assert_eq!(parsed.len(), 1);
        let object = parsed[0].as_object().unwrap();
        assert_eq!(object["_id"], Value::String(record.id.to_string()));
        assert_eq!(object["name"], "Alice");
        assert_eq!(object["skills"], serde_json::json!(["Go", "SQL"]));
        assert_eq!(object["resume_file"], "alice.pdf");
        assert_eq!(object.len(), 4);
    }

    #[test]
    fn test_csv_unions_columns_and_drops_id() {
        let records = vec![
            stored(alice()),
            stored(
                ParsedRecord::new()
                    .with("name", FieldValue::text("Bob"))
                    .with("email", FieldValue::text("bob@example.com"))
                    .with("degree", FieldValue::Missing),
            ),
        ];
        let csv = String::from_utf8(to_csv(&records).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "name,skills,resume_file,email,degree");
        assert_eq!(lines[1], "Alice,\"Go, SQL\",alice.pdf,,");
        assert_eq!(lines[2], "Bob,,,bob@example.com,");
        assert!(!csv.contains("_id"));
    }

    #[test]
    fn test_csv_ignores_a_stored_id_field() {
        let records = vec![stored(
            ParsedRecord::new()
                .with("_id", FieldValue::text("legacy"))
                .with("name", FieldValue::text("Carol")),
        )];
        let csv = String::from_utf8(to_csv(&records).unwrap()).unwrap();
        assert_eq!(csv, "name\nCarol\n");
    }

    #[test]
    fn test_export_format_query_values() {
        let format: ExportFormat = serde_json::from_str("\"csv\"").unwrap();
        assert_eq!(format, ExportFormat::Csv);
        assert_eq!(ExportFormat::Json.content_type(), "application/json");
        assert_eq!(ExportFormat::Json.file_name(), "resumes.json");
    }
}
