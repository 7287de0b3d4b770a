use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::extraction::ResumeExtractor;
use crate::session::SessionStore;
use crate::storage::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Resume collection. Postgres or in-memory, chosen at startup.
    pub store: Arc<dyn ResumeStore>,
    pub sessions: Arc<dyn SessionStore>,
    /// Heuristic by default, LLM when `ANTHROPIC_API_KEY` is set.
    pub extractor: Arc<dyn ResumeExtractor>,
    pub config: Config,
    /// Held for the duration of each upload, save and export so that one user
    /// action completes before the next begins.
    pub action_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ResumeStore>,
        sessions: Arc<dyn SessionStore>,
        extractor: Arc<dyn ResumeExtractor>,
        config: Config,
    ) -> Self {
        Self {
            store,
            sessions,
            extractor,
            config,
            action_gate: Arc::new(Mutex::new(())),
        }
    }
}
