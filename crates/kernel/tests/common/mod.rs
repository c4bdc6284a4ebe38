#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Builds the REAL kernel router over in-memory sessions and record storage,
//! so tests exercise the actual routes without PostgreSQL or Redis.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::Path as UrlPath;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::Session;
use tower_sessions::cookie::SameSite;
use uuid::Uuid;

use punchcard_kernel::content::{ContentType, ContentTypeRegistry};
use punchcard_kernel::session::{SESSION_USER_ID, create_memory_session_layer};
use punchcard_kernel::store::{ContentStore, MemoryContentStore};
use punchcard_kernel::theme::ThemeEngine;
use punchcard_kernel::upload::UploadDir;
use punchcard_kernel::{AppState, ContentConfig, app_routes, finish_router};
use punchcard_test_utils::{MultipartBody, content_types};

/// Maximum upload size used by test apps.
pub const TEST_MAX_UPLOAD: usize = 64 * 1024;

/// Test application wrapping the kernel router.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryContentStore>,
    pub uploads_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.uploads_dir).ok();
    }
}

impl TestApp {
    /// Create a test app with the services and events content types.
    pub async fn new() -> Self {
        let types: Vec<ContentType> = [content_types::services_type(), content_types::events_type()]
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("invalid content type fixture"))
            .collect();
        let registry = ContentTypeRegistry::new(types).expect("invalid registry");

        let store = Arc::new(MemoryContentStore::new());
        for ty in registry.list() {
            store.ensure_table(&ty.id).await.unwrap();
        }

        let templates = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates");
        let theme = ThemeEngine::new(&templates).expect("failed to load templates");

        let uploads_dir =
            std::env::temp_dir().join(format!("punchcard-test-uploads-{}", Uuid::new_v4()));

        let state = AppState::from_parts(
            ContentConfig::default(),
            registry,
            theme,
            store.clone(),
            UploadDir::new(&uploads_dir, TEST_MAX_UPLOAD),
        );

        let routes = app_routes(&state)
            .route("/test/login/{id}", get(test_login))
            .route("/test/session/{key}", get(test_session_value));
        let router = finish_router(
            routes,
            state,
            create_memory_session_layer(SameSite::Lax, false),
        );

        Self {
            router,
            store,
            uploads_dir,
        }
    }

    /// Send a request to the app.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a GET request, with cookies from a previous response.
    pub async fn get(&self, uri: &str, cookies: &str) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// POST a multipart body.
    pub async fn post_multipart(
        &self,
        uri: &str,
        body: &MultipartBody,
        cookies: &str,
        referer: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, body.content_type());
        if !cookies.is_empty() {
            builder = builder.header(header::COOKIE, cookies);
        }
        if let Some(referer) = referer {
            builder = builder.header(header::REFERER, referer);
        }
        self.request(builder.body(Body::from(body.build())).unwrap())
            .await
    }

    /// Log in as `author` and return session cookies.
    pub async fn login(&self, author: Uuid) -> String {
        let response = self.get(&format!("/test/login/{author}"), "").await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        extract_cookies(&response)
    }

    /// Read a session value without consuming it.
    pub async fn session_value(&self, key: &str, cookies: &str) -> Value {
        let response = self.get(&format!("/test/session/{key}"), cookies).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }
}

async fn test_login(session: Session, UrlPath(id): UrlPath<Uuid>) -> StatusCode {
    session.insert(SESSION_USER_ID, id).await.unwrap();
    StatusCode::NO_CONTENT
}

async fn test_session_value(session: Session, UrlPath(key): UrlPath<String>) -> Json<Value> {
    let value: Option<Value> = session.get(&key).await.unwrap();
    Json(value.unwrap_or(Value::Null))
}

/// Extract cookies from a response's Set-Cookie headers.
pub fn extract_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| {
            // Extract just the cookie name=value, ignoring attributes
            cookie.split(';').next()
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Read a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Location header of a redirect.
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
