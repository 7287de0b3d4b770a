use serde::Serialize;
use uuid::Uuid;

use crate::models::record::{display_label, ParsedRecord};
use crate::session::{ControllerState, FileFailure, Session};

/// Everything the page needs to redraw itself from scratch.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: ControllerState,
    pub entries: Vec<EntryView>,
    pub failures: Vec<FileFailure>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryView {
    /// 1-based position in the batch.
    pub index: usize,
    pub file_name: String,
    pub record: ParsedRecord,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
pub struct FieldView {
    pub key: String,
    pub label: String,
    pub value: String,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let parsed = session.batch.entries.len();
        let message = match session.state {
            ControllerState::Parsed if parsed > 0 => {
                Some(format!("Successfully processed {parsed} resume(s)!"))
            }
            ControllerState::Saved => Some(format!("Saved {parsed} resume(s) to the database!")),
            _ => None,
        };

        let entries = session
            .batch
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| EntryView {
                index: i + 1,
                file_name: entry.file_name.clone(),
                record: entry.record.clone(),
                fields: entry
                    .record
                    .iter()
                    .map(|(key, value)| FieldView {
                        key: key.clone(),
                        label: display_label(key),
                        value: value.display(),
                    })
                    .collect(),
            })
            .collect();

        SessionView {
            session_id: session.id,
            state: session.state,
            entries,
            failures: session.batch.failures.clone(),
            message,
        }
    }
}
