use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and the backends wired in at startup.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-parser",
        "backends": {
            "store": state.store.backend(),
            "sessions": state.sessions.backend(),
            "extractor": state.extractor.backend(),
        }
    }))
}
