//! Punchcard CMS Kernel Library
//!
//! Content type routes, form handling, and record storage. The main entry
//! point for running the server is the `punchcard` binary; the library is
//! exposed for integration testing.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod flash;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod theme;
pub mod upload;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

pub use config::{Config, ContentConfig};
pub use error::{AppError, AppResult};
pub use state::AppState;

/// Every application route, with the not-found fallback, before layers.
pub fn app_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(routes::content::router(
            state.content(),
            state.uploads().body_limit(),
        ))
        .merge(routes::health::router())
        .merge(routes::uploads::router())
        .fallback(routes::not_found::fallback)
}

/// Apply the session and trace layers and bind state.
///
/// Middleware layers (last added = first executed in request flow):
/// TraceLayer → session → routes
pub fn finish_router<S>(
    router: Router<AppState>,
    state: AppState,
    session_layer: SessionManagerLayer<S>,
) -> Router
where
    S: SessionStore + Clone,
{
    router
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the complete application router.
pub fn build_router<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    finish_router(app_routes(&state), state, session_layer)
}
