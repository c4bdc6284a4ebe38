//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{Config, ContentConfig};
use crate::content::ContentTypeRegistry;
use crate::db;
use crate::store::{ContentStore, PgContentStore};
use crate::theme::{SharedThemeEngine, ThemeEngine};
use crate::upload::UploadDir;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Content routing and record defaults.
    content: ContentConfig,

    /// Content type registry.
    content_types: ContentTypeRegistry,

    /// Theme engine for template rendering.
    theme: SharedThemeEngine,

    /// Record storage.
    store: Arc<dyn ContentStore>,

    /// Where uploaded files are written.
    uploads: UploadDir,
}

impl AppState {
    /// Create application state backed by PostgreSQL.
    ///
    /// Loads content types and templates from disk and makes sure every
    /// registered type has its record table.
    pub async fn new(config: &Config) -> Result<Self> {
        let content_types = ContentTypeRegistry::load_dir(&config.content_types_dir)
            .context("failed to load content types")?;

        let theme = ThemeEngine::new(&config.templates_dir).context("failed to load templates")?;

        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        let store = PgContentStore::new(pool);
        store
            .ensure_tables(content_types.list().iter().map(|t| t.id.as_str()))
            .await
            .context("failed to create content record tables")?;

        Ok(Self::from_parts(
            config.content.clone(),
            content_types,
            theme,
            Arc::new(store),
            UploadDir::new(&config.uploads_dir, config.max_upload_size),
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        content: ContentConfig,
        content_types: ContentTypeRegistry,
        theme: ThemeEngine,
        store: Arc<dyn ContentStore>,
        uploads: UploadDir,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                content,
                content_types,
                theme: Arc::new(theme),
                store,
                uploads,
            }),
        }
    }

    /// Get the content configuration.
    pub fn content(&self) -> &ContentConfig {
        &self.inner.content
    }

    /// Get the content type registry.
    pub fn content_types(&self) -> &ContentTypeRegistry {
        &self.inner.content_types
    }

    /// Get the theme engine.
    pub fn theme(&self) -> &SharedThemeEngine {
        &self.inner.theme
    }

    /// Get the record store.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.inner.store
    }

    /// Get the upload directory.
    pub fn uploads(&self) -> &UploadDir {
        &self.inner.uploads
    }

    /// Check if the record store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.store.health().await
    }
}
