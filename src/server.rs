//! HTTP surface: job submission, progress polling, and CSV download.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::export::sanitize_download_filename;
use crate::job::JobController;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>CBSE Affiliation Scraper</title></head>
<body>
  <h1>CBSE Affiliation Scraper</h1>
  <form action="/scrape" method="post">
    <label>Affiliation numbers (comma-separated):
      <input type="text" name="affnos" size="60">
    </label><br>
    <label>Export filename:
      <input type="text" name="filename" value="schools">
    </label><br>
    <button type="submit">Scrape</button>
  </form>
  <p>Poll <a href="/progress">/progress</a>, then fetch <a href="/download">/download</a>.</p>
</body>
</html>
"#;

/// Job submission form.
#[derive(Debug, Deserialize)]
pub struct ScrapeForm {
    /// Comma-separated affiliation numbers.
    pub affnos: String,
    /// Desired export filename, extension optional.
    pub filename: String,
}

#[derive(Debug, Serialize)]
struct ScrapeAccepted {
    scheduled: usize,
    skipped: Vec<String>,
    filename: String,
}

#[derive(Debug, Serialize)]
struct ProgressResponse {
    percent: u8,
}

/// Builds the application router over a shared controller.
pub fn router(controller: Arc<JobController>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/scrape", post(scrape))
        .route("/progress", get(progress))
        .route("/download", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(controller)
}

/// Binds `addr` and serves the application until the task is dropped.
///
/// # Errors
///
/// Returns the underlying IO error if binding or serving fails.
pub async fn serve(controller: Arc<JobController>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP surface listening");
    axum::serve(listener, router(controller)).await
}

async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn scrape(
    State(controller): State<Arc<JobController>>,
    Form(form): Form<ScrapeForm>,
) -> Response {
    match controller.start(&form.affnos, &form.filename) {
        Ok(started) => (
            StatusCode::ACCEPTED,
            Json(ScrapeAccepted {
                scheduled: started.scheduled,
                skipped: started.skipped,
                filename: started.filename,
            }),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

async fn progress(State(controller): State<Arc<JobController>>) -> Json<ProgressResponse> {
    Json(ProgressResponse {
        percent: controller.progress(),
    })
}

async fn download(State(controller): State<Arc<JobController>>) -> Response {
    match controller.export_csv() {
        Ok(bytes) => {
            let filename = sanitize_download_filename(
                &controller
                    .export_filename()
                    .unwrap_or_else(|| "export.csv".to_string()),
            );
            (
                [
                    (
                        header::CONTENT_TYPE,
                        "text/csv; charset=utf-8".to_string(),
                    ),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}
