use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resumes::export::{export_all, ExportFormat, ExportOutcome};
use crate::resumes::save::save_batch;
use crate::resumes::upload::{process_uploads, UploadedDocument};
use crate::resumes::view::SessionView;
use crate::session::{ControllerState, Session};
use crate::state::AppState;

pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: ExportFormat,
}

#[derive(Debug, Serialize)]
pub struct ExportWarning {
    pub status: &'static str,
    pub message: &'static str,
}

/// POST /api/v1/uploads
///
/// Accepts any number of file parts; each is parsed in order and the result
/// replaces the session's previous batch.
pub async fn handle_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut documents = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        // Browsers send an empty file part when nothing was selected.
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read {file_name}: {e}")))?;
        documents.push(UploadedDocument { file_name, bytes });
    }
    if documents.is_empty() {
        return Err(AppError::Validation("No files were uploaded".to_string()));
    }

    let _gate = state.action_gate.lock().await;

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut session = load_or_new(&state, session_id(&headers)?).await?;
    let batch = process_uploads(
        state.extractor.as_ref(),
        &state.config.upload_dir,
        documents,
    )
    .await;
    session
        .replace_batch(batch)
        .map_err(|e| AppError::Internal(e.into()))?;
    state.sessions.save(&session).await?;

    Ok(session_response(&session))
}

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let session = load_or_new(&state, session_id(&headers)?).await?;
    Ok(session_response(&session))
}

/// POST /api/v1/session/save
///
/// Inserts the current batch. Only valid right after a parse; a failure part-way
/// leaves the already inserted prefix in place and the session still `Parsed`.
pub async fn handle_save(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = session_id(&headers)?
        .ok_or_else(|| AppError::Validation("Missing x-session-id header".to_string()))?;

    let _gate = state.action_gate.lock().await;

    let mut session = state
        .sessions
        .load(id)
        .await?
        .ok_or_else(|| AppError::Conflict("Upload resumes before saving".to_string()))?;
    if session.state != ControllerState::Parsed {
        return Err(AppError::Conflict(format!(
            "Nothing to save in state {:?}",
            session.state
        )));
    }
    if session.batch.entries.is_empty() {
        return Err(AppError::Validation(
            "The last upload produced no parsed resumes".to_string(),
        ));
    }

    let report = save_batch(state.store.as_ref(), &session.batch).await?;
    info!("Session {id} saved {} resume(s)", report.saved());

    session
        .mark_saved()
        .map_err(|e| AppError::Internal(e.into()))?;
    state.sessions.save(&session).await?;

    Ok(session_response(&session))
}

/// GET /api/v1/export?format=json|csv
///
/// Independent of the session: always exports the whole collection.
pub async fn handle_export(
    State(state): State<AppState>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| {
        AppError::Validation(format!(
            "Invalid export request (format must be json or csv): {}",
            e.body_text()
        ))
    })?;
    let _gate = state.action_gate.lock().await;

    match export_all(state.store.as_ref(), query.format).await? {
        ExportOutcome::Empty => Ok(Json(ExportWarning {
            status: "empty",
            message: "No data found in the database.",
        })
        .into_response()),
        ExportOutcome::File(file) => {
            let disposition = format!("attachment; filename=\"{}\"", file.format.file_name());
            Ok((
                [
                    (header::CONTENT_TYPE, file.format.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                file.body,
            )
                .into_response())
        }
    }
}

/// Reads the optional session header. A present but malformed id is rejected.
fn session_id(headers: &HeaderMap) -> Result<Option<Uuid>, AppError> {
    headers
        .get(&SESSION_HEADER)
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|s| Uuid::parse_str(s.trim()).ok())
                .ok_or_else(|| AppError::Validation("Invalid x-session-id header".to_string()))
        })
        .transpose()
}

async fn load_or_new(state: &AppState, id: Option<Uuid>) -> Result<Session, AppError> {
    let Some(id) = id else {
        return Ok(Session::new(Uuid::new_v4()));
    };
    Ok(state
        .sessions
        .load(id)
        .await?
        .unwrap_or_else(|| Session::new(id)))
}

fn session_response(session: &Session) -> Response {
    let mut response = Json(SessionView::from(session)).into_response();
    if let Ok(value) = HeaderValue::from_str(&session.id.to_string()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}
