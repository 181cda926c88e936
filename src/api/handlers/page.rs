use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// Upload form and player list; everything dynamic happens in the browser.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
