//! Content type routes.
//!
//! Home page listing every content type, per-type landing page, add form,
//! and the multipart save handler.

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use serde_json::json;
use tower_sessions::Session;
use tracing::{debug, info, warn};

use crate::config::ContentConfig;
use crate::content::{
    ContentRecord, ContentType, PublishWindow, ValidationErrors, build_form, normalize, only,
    validate,
};
use crate::error::{AppError, AppResult};
use crate::flash::{AddFormState, Flash, FlashPurpose, MissingTypeNotice};
use crate::routes::helpers::{render_page, require_author};
use crate::routes::not_found;
use crate::state::AppState;
use crate::theme::ThemeEngine;
use crate::upload::SubmittedForm;

/// Create the content router.
///
/// Paths live under the configured base; the save route accepts bodies up to
/// `body_limit` bytes.
pub fn router(content: &ContentConfig, body_limit: usize) -> Router<AppState> {
    let base = content.home_path();

    Router::new()
        .route(&base, get(home))
        .route(&format!("{base}/{{type}}"), get(landing))
        .route(
            &format!("{base}/{{type}}/{}", content.actions.add),
            get(add_form),
        )
        .route(
            &format!("{base}/{{type}}/{}", content.actions.save),
            post(save).layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Content home page.
async fn home(State(state): State<AppState>) -> AppResult<Response> {
    let content = state.content();

    let mut context = tera::Context::new();
    context.insert(
        "content",
        &json!({
            "home": content.home,
            "base": content.base,
            "types": state.content_types().list(),
        }),
    );

    Ok(render_page(&state, &["content/home".to_string()], &context)?.into_response())
}

/// Landing page of a content type.
async fn landing(
    State(state): State<AppState>,
    Path(type_slug): Path<String>,
    session: Session,
    uri: Uri,
) -> AppResult<Response> {
    let Some(content_type) = state.content_types().find(&type_slug) else {
        return missing_type(&state, &session, &type_slug).await;
    };

    let mut context = tera::Context::new();
    context.insert(
        "content",
        &json!({
            "base": uri.path(),
            "actions": state.content().actions,
            "type": content_type,
        }),
    );

    let suggestions = ThemeEngine::content_suggestions("landing", &content_type.id);
    Ok(render_page(&state, &suggestions, &context)?.into_response())
}

/// Add form of a content type, refilled from a rejected submission.
async fn add_form(
    State(state): State<AppState>,
    Path(type_slug): Path<String>,
    session: Session,
    uri: Uri,
) -> AppResult<Response> {
    // Taken before the lookup so it never survives past this render
    let prior: Option<AddFormState> = Flash::new(&session)
        .take(FlashPurpose::ContentAdd)
        .await?;

    let (errors, values) = match prior {
        Some(saved) if saved.type_id.eq_ignore_ascii_case(&type_slug) => {
            (saved.errors, saved.content)
        }
        Some(saved) => {
            debug!(stored = %saved.type_id, requested = %type_slug, "discarding add form state for another type");
            Default::default()
        }
        None => Default::default(),
    };
    let normalized = normalize(&values);

    let Some(content_type) = state.content_types().find(&type_slug) else {
        return missing_type(&state, &session, &type_slug).await;
    };

    let merged = only(&content_type.id, &normalized, state.content_types().list())?;
    let form = build_form(&merged, &errors)?;

    let actions = &state.content().actions;
    let mut context = tera::Context::new();
    context.insert("form", &form);
    context.insert("action", &save_action(uri.path(), &actions.add, &actions.save));
    context.insert("type", content_type);

    let suggestions = ThemeEngine::content_suggestions("add", &content_type.id);
    Ok(render_page(&state, &suggestions, &context)?.into_response())
}

/// Save a submission of a content type.
///
/// Valid submissions are stored and redirect to the landing page. Rejected
/// ones are kept in the session and redirect back to the form.
async fn save(
    State(state): State<AppState>,
    Path(type_slug): Path<String>,
    session: Session,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Response> {
    let Some(content_type) = state.content_types().find(&type_slug) else {
        return missing_type(&state, &session, &type_slug).await;
    };

    // Checked before parsing so anonymous bodies never reach the upload dir
    let author = require_author(&session).await?;

    let form = SubmittedForm::from_multipart(multipart, state.uploads()).await?;
    let content = state.content();

    if let Err(errors) = validate(&form.values, content_type, content.timezone) {
        return reject(&session, &headers, content, content_type, errors, form).await;
    }

    let window = PublishWindow::from_values(&form.values);
    let sunrise = window
        .sunrise(content.timezone)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let sunset = window
        .sunset(content.timezone)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let record = ContentRecord::new(&form.values, author, &content.language, sunrise, sunset);

    state.store().insert(&content_type.id, &record).await?;

    info!(
        content_type = %content_type.id,
        id = %record.id,
        author = %author,
        files = form.files.len(),
        "content saved"
    );

    Ok(Redirect::to(&content.landing_path(&content_type.id)).into_response())
}

/// Keep a rejected submission for the next add form render and send the
/// user back to where they came from.
async fn reject(
    session: &Session,
    headers: &HeaderMap,
    content: &ContentConfig,
    content_type: &ContentType,
    errors: ValidationErrors,
    form: SubmittedForm,
) -> AppResult<Response> {
    debug!(content_type = %content_type.id, errors = errors.len(), "submission rejected");

    let rejected = AddFormState {
        type_id: content_type.id.clone(),
        errors,
        content: form.values,
    };
    Flash::new(session)
        .put(FlashPurpose::ContentAdd, &rejected)
        .await?;

    let target = same_origin_referer(headers)
        .unwrap_or_else(|| content.add_path(&content_type.id));

    Ok(Redirect::to(&target).into_response())
}

/// Path and query of the `Referer` header when it points back at this host.
///
/// Relative references must start with a single `/`. Absolute ones must name
/// the request's `Host`.
fn same_origin_referer(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?;

    if referer.starts_with('/') {
        return (!referer.starts_with("//") && !referer.contains('\\'))
            .then(|| referer.to_string());
    }

    let parsed = url::Url::parse(referer).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}:{port}", parsed.host_str()?),
        None => parsed.host_str()?.to_string(),
    };
    if !origin.eq_ignore_ascii_case(host) {
        return None;
    }

    Some(match parsed.query() {
        Some(query) => format!("{}?{query}", parsed.path()),
        None => parsed.path().to_string(),
    })
}

/// Leave a notice about the unknown type for the not-found page.
async fn flag_missing(content: &ContentConfig, session: &Session, type_slug: &str) -> AppResult<()> {
    let notice = MissingTypeNotice {
        message: content.missing_message_for(type_slug),
        safe: content.home_path(),
    };
    Flash::new(session)
        .put(FlashPurpose::MissingType, &notice)
        .await?;
    Ok(())
}

async fn missing_type(state: &AppState, session: &Session, type_slug: &str) -> AppResult<Response> {
    warn!(content_type = %type_slug, "content type not found");
    flag_missing(state.content(), session, type_slug).await?;
    not_found::render(state, session).await
}

/// Form action for an add page: its path with the trailing add segment
/// swapped for the save segment.
fn save_action(path: &str, add: &str, save: &str) -> String {
    match path.strip_suffix(add) {
        Some(prefix) if prefix.ends_with('/') => format!("{prefix}{save}"),
        _ => path.to_string(),
    }
}
