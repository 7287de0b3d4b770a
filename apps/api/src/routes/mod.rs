pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::resumes::{handlers, page};
use crate::state::AppState;

/// Ceiling for one upload request, covering every file in the batch together.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/uploads",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route("/api/v1/session/save", post(handlers::handle_save))
        .route("/api/v1/export", get(handlers::handle_export))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::{ExtractionError, ResumeExtractor};
    use crate::models::record::{FieldValue, ParsedRecord, RESUME_FILE_FIELD};
    use crate::session::MemorySessionStore;
    use crate::storage::{MemoryResumeStore, ResumeStore};

    const BOUNDARY: &str = "resume-test-boundary";

    /// Treats the uploaded bytes as the extracted JSON record; anything else is corrupt.
    struct JsonExtractor;

    #[async_trait]
    impl ResumeExtractor for JsonExtractor {
        async fn extract(&self, path: &Path) -> Result<ParsedRecord, ExtractionError> {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| ExtractionError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            serde_json::from_slice(&bytes).map_err(|_| ExtractionError::NoText)
        }

        fn backend(&self) -> &'static str {
            "json"
        }
    }

    struct Harness {
        app: Router,
        store: Arc<MemoryResumeStore>,
        _scratch: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryResumeStore::new());
        let config = Config {
            database_url: None,
            redis_url: None,
            anthropic_api_key: None,
            upload_dir: scratch.path().join("uploads"),
            session_ttl_secs: 60,
            port: 0,
            rust_log: "info".to_string(),
        };
        let state = AppState::new(
            store.clone(),
            Arc::new(MemorySessionStore::new()),
            Arc::new(JsonExtractor),
            config,
        );
        Harness {
            app: build_router(state),
            store,
            _scratch: scratch,
        }
    }

    fn upload_request(files: &[(&str, &str)], session: Option<&str>) -> Request<Body> {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        let mut builder = Request::post("/api/v1/uploads").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(id) = session {
            builder = builder.header("x-session-id", id);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn save_request(session: &str) -> Request<Body> {
        Request::post("/api/v1/session/save")
            .header("x-session-id", session)
            .body(Body::empty())
            .unwrap()
    }

    fn export_request(format: &str) -> Request<Body> {
        Request::get(format!("/api/v1/export?format={format}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn session_header(response: &Response) -> String {
        response.headers()["x-session-id"]
            .to_str()
            .unwrap()
            .to_string()
    }

    const ALICE: &str = r#"{"name":"Alice","skills":["Go","SQL"]}"#;

    #[tokio::test]
    async fn test_upload_save_export_flow() {
        let h = harness();

        let response = send(
            &h.app,
            upload_request(&[("alice.pdf", ALICE), ("broken.docx", "%%corrupt%%")], None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = session_header(&response);
        let view = body_json(response).await;
        assert_eq!(view["state"], "parsed");
        assert_eq!(view["entries"].as_array().unwrap().len(), 1);
        assert_eq!(view["entries"][0]["file_name"], "alice.pdf");
        assert_eq!(view["failures"].as_array().unwrap().len(), 1);
        assert_eq!(view["failures"][0]["file_name"], "broken.docx");
        assert_eq!(view["message"], "Successfully processed 1 resume(s)!");

        let response = send(&h.app, save_request(&session)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "saved");

        let stored = h.store.find_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        let expected = ParsedRecord::new()
            .with("name", FieldValue::text("Alice"))
            .with("skills", FieldValue::list(["Go", "SQL"]))
            .with(RESUME_FILE_FIELD, FieldValue::text("alice.pdf"));
        assert_eq!(stored[0].record, expected);

        let response = send(&h.app, export_request("json")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"resumes.json\""
        );
        let exported = body_json(response).await;
        assert_eq!(exported[0]["_id"], stored[0].id.to_string());
        assert_eq!(exported[0]["resume_file"], "alice.pdf");

        let response = send(&h.app, export_request("csv")).await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        let csv = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(csv, "name,skills,resume_file\nAlice,\"Go, SQL\",alice.pdf\n");
    }

    #[tokio::test]
    async fn test_export_of_empty_collection_is_a_warning() {
        let h = harness();
        let response = send(&h.app, export_request("csv")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "empty");
        assert_eq!(body["message"], "No data found in the database.");
    }

    #[tokio::test]
    async fn test_unknown_export_format_is_rejected() {
        let h = harness();
        let response = send(&h.app, export_request("xml")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("json or csv"));
    }

    #[tokio::test]
    async fn test_batch_larger_than_two_megabytes_is_accepted() {
        let h = harness();
        let padding = "x".repeat(800 * 1024);
        let documents: Vec<(String, String)> = ["a.pdf", "b.pdf", "c.docx"]
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    format!(r#"{{"name":"{name}","summary":"{padding}"}}"#),
                )
            })
            .collect();
        let files: Vec<(&str, &str)> = documents
            .iter()
            .map(|(name, body)| (name.as_str(), body.as_str()))
            .collect();

        let response = send(&h.app, upload_request(&files, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["entries"].as_array().unwrap().len(), 3);
        assert!(view["failures"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_is_only_allowed_once_per_parse() {
        let h = harness();
        let response = send(&h.app, upload_request(&[("alice.pdf", ALICE)], None)).await;
        let session = session_header(&response);

        assert_eq!(
            send(&h.app, save_request(&session)).await.status(),
            StatusCode::OK
        );
        assert_eq!(
            send(&h.app, save_request(&session)).await.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(h.store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_without_upload_conflicts() {
        let h = harness();
        let response = send(&h.app, save_request(&uuid::Uuid::new_v4().to_string())).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_save_of_all_failed_batch_is_rejected() {
        let h = harness();
        let response = send(&h.app, upload_request(&[("bad.pdf", "nope")], None)).await;
        let session = session_header(&response);
        let view = body_json(response).await;
        assert!(view["entries"].as_array().unwrap().is_empty());
        assert!(view["message"].is_null());

        let response = send(&h.app, save_request(&session)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(h.store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_upload_replaces_previous_batch() {
        let h = harness();
        let response = send(&h.app, upload_request(&[("alice.pdf", ALICE)], None)).await;
        let session = session_header(&response);

        let response = send(
            &h.app,
            upload_request(&[("bob.docx", r#"{"name":"Bob"}"#)], Some(&session)),
        )
        .await;
        assert_eq!(session_header(&response), session);
        let view = body_json(response).await;
        let entries = view["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["file_name"], "bob.docx");

        let response = send(
            &h.app,
            Request::get("/api/v1/session")
                .header("x-session-id", &session)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(body_json(response).await["entries"][0]["file_name"], "bob.docx");
    }

    #[tokio::test]
    async fn test_upload_without_files_is_rejected() {
        let h = harness();
        let response = send(&h.app, upload_request(&[], None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_session_header_is_rejected() {
        let h = harness();
        let response = send(&h.app, upload_request(&[("alice.pdf", ALICE)], Some("nope"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session_renders_idle() {
        let h = harness();
        let response = send(
            &h.app,
            Request::get("/api/v1/session").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "idle");
    }

    #[tokio::test]
    async fn test_health_reports_backends() {
        let h = harness();
        let response = send(&h.app, Request::get("/health").body(Body::empty()).unwrap()).await;
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backends"]["store"], "memory");
        assert_eq!(body["backends"]["extractor"], "json");
    }

    #[tokio::test]
    async fn test_index_page_is_served() {
        let h = harness();
        let response = send(&h.app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("/api/v1/uploads"));
    }
}
