//! Serving of uploaded files.

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{Response, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use tokio::fs;
use tracing::warn;

use crate::state::AppState;

/// Create the uploads router.
pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/{*path}", get(serve_upload))
}

/// Serve a previously uploaded file.
async fn serve_upload(State(state): State<AppState>, Path(path): Path<String>) -> Response<Body> {
    let Some(file_path) = state.uploads().resolve(&path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let content = match fs::read(&file_path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %file_path.display(), error = %e, "failed to read upload");
            }
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    (
        [
            (header::CONTENT_TYPE, mime_from_path(&file_path)),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        content,
    )
        .into_response()
}

fn mime_from_path(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("css") => "text/css",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path as FsPath;

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(FsPath::new("a/b/photo.PNG")), "image/png");
        assert_eq!(mime_from_path(FsPath::new("doc.pdf")), "application/pdf");
        assert_eq!(
            mime_from_path(FsPath::new("noext")),
            "application/octet-stream"
        );
    }
}
