use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
/// The single-page UI. All state lives server-side; the page redraws from `SessionView`.
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}
