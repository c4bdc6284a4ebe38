//! Not-found page.
//!
//! Serves as the router fallback and as the target content routes delegate
//! to when a requested content type does not exist.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower_sessions::Session;

use crate::error::AppResult;
use crate::flash::{Flash, FlashPurpose, MissingTypeNotice};
use crate::routes::helpers::render_page;
use crate::state::AppState;

const DEFAULT_MESSAGE: &str = "Page not found";

/// Render `404.html`, consuming any pending missing-type notice.
pub async fn render(state: &AppState, session: &Session) -> AppResult<Response> {
    let notice: Option<MissingTypeNotice> = Flash::new(session)
        .take(FlashPurpose::MissingType)
        .await?;

    let notice = notice.unwrap_or_else(|| MissingTypeNotice {
        message: DEFAULT_MESSAGE.to_string(),
        safe: "/".to_string(),
    });

    let mut context = tera::Context::new();
    context.insert("message", &notice.message);
    context.insert("safe", &notice.safe);

    let html = render_page(state, &["404".to_string()], &context)?;
    Ok((StatusCode::NOT_FOUND, html).into_response())
}

/// Router fallback handler.
pub async fn fallback(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    render(&state, &session).await
}
