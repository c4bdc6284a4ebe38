//! Shared route helpers for page rendering.

use axum::response::Html;
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::session::SESSION_USER_ID;
use crate::state::AppState;

/// Require an authenticated user and return their id.
pub async fn require_author(session: &Session) -> AppResult<Uuid> {
    let user_id: Option<Uuid> = session.get(SESSION_USER_ID).await?;
    user_id.ok_or(AppError::Unauthorized)
}

/// Render the first existing template among `suggestions`.
pub fn render_page(
    state: &AppState,
    suggestions: &[String],
    context: &tera::Context,
) -> AppResult<Html<String>> {
    let html = state.theme().render_suggested(suggestions, context)?;
    Ok(Html(html))
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
