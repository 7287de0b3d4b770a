//! Per-session state: the controller state and the most recent upload batch.
//!
//! Sessions are keyed by the `x-session-id` header. `AppState` holds an
//! `Arc<dyn SessionStore>`: Redis when `REDIS_URL` is set, in-process otherwise.

pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::record::ParsedRecord;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("session payload is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Presentation controller states. Export is orthogonal and never changes the state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    FilesUploaded,
    Parsed,
    Saved,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot move from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ControllerState,
    pub to: ControllerState,
}

impl ControllerState {
    /// A file selection is accepted from every state and starts a new batch.
    pub fn files_uploaded(self) -> ControllerState {
        ControllerState::FilesUploaded
    }

    pub fn parsed(self) -> Result<ControllerState, InvalidTransition> {
        self.step(ControllerState::FilesUploaded, ControllerState::Parsed)
    }

    pub fn saved(self) -> Result<ControllerState, InvalidTransition> {
        self.step(ControllerState::Parsed, ControllerState::Saved)
    }

    fn step(
        self,
        required: ControllerState,
        to: ControllerState,
    ) -> Result<ControllerState, InvalidTransition> {
        if self == required {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

/// A successfully parsed document paired with the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub file_name: String,
    pub record: ParsedRecord,
}

/// A document that could not be parsed, with the reason shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file_name: String,
    pub message: String,
}

/// Result of one upload action. Write-once: replaced wholesale by the next upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionBatch {
    pub entries: Vec<BatchEntry>,
    pub failures: Vec<FileFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub state: ControllerState,
    pub batch: SessionBatch,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            state: ControllerState::Idle,
            batch: SessionBatch::default(),
            updated_at: Utc::now(),
        }
    }

    /// Discards the previous batch and installs `batch` as the parsed result.
    pub fn replace_batch(&mut self, batch: SessionBatch) -> Result<(), InvalidTransition> {
        self.state = self.state.files_uploaded().parsed()?;
        self.batch = batch;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn mark_saved(&mut self) -> Result<(), InvalidTransition> {
        self.state = self.state.saved()?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<Option<Session>, SessionError>;

    async fn save(&self, session: &Session) -> Result<(), SessionError>;

    fn backend(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldValue;

    fn batch_of(names: &[&str]) -> SessionBatch {
        SessionBatch {
            entries: names
                .iter()
                .map(|n| BatchEntry {
                    file_name: n.to_string(),
                    record: ParsedRecord::new().with("name", FieldValue::text(*n)),
                })
                .collect(),
            failures: vec![],
        }
    }

    #[test]
    fn test_upload_then_save_walks_the_state_machine() {
        let mut session = Session::new(Uuid::new_v4());
        assert_eq!(session.state, ControllerState::Idle);

        session.replace_batch(batch_of(&["a.pdf"])).unwrap();
        assert_eq!(session.state, ControllerState::Parsed);

        session.mark_saved().unwrap();
        assert_eq!(session.state, ControllerState::Saved);
    }

    #[test]
    fn test_save_requires_parsed_state() {
        let mut session = Session::new(Uuid::new_v4());
        assert_eq!(
            session.mark_saved(),
            Err(InvalidTransition {
                from: ControllerState::Idle,
                to: ControllerState::Saved,
            })
        );

        session.replace_batch(batch_of(&["a.pdf"])).unwrap();
        session.mark_saved().unwrap();
        assert!(session.mark_saved().is_err());
    }

    #[test]
    fn test_new_upload_replaces_batch_from_any_state() {
        let mut session = Session::new(Uuid::new_v4());
        session.replace_batch(batch_of(&["a.pdf", "b.pdf"])).unwrap();
        session.mark_saved().unwrap();

        session.replace_batch(batch_of(&["c.docx"])).unwrap();
        assert_eq!(session.state, ControllerState::Parsed);
        assert_eq!(session.batch, batch_of(&["c.docx"]));
    }

    #[test]
    fn test_parsed_only_follows_files_uploaded() {
        assert!(ControllerState::Idle.parsed().is_err());
        assert_eq!(
            ControllerState::Saved.files_uploaded().parsed(),
            Ok(ControllerState::Parsed)
        );
    }
}
