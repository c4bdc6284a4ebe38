//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Serialize;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Redis connection URL for sessions. When None, sessions are kept in memory.
    pub redis_url: Option<String>,

    /// Cookie SameSite policy: "strict", "lax", or "none" (default: "lax").
    pub cookie_same_site: String,

    /// Whether session cookies are marked Secure (default: true).
    pub cookie_secure: bool,

    /// Path to the Tera templates directory (default: ./templates).
    pub templates_dir: PathBuf,

    /// Path to the content type definitions (default: ./content-types).
    pub content_types_dir: PathBuf,

    /// Path uploaded files are written to (default: ./public/uploads).
    pub uploads_dir: PathBuf,

    /// Maximum size of a single uploaded file in bytes (default: 10 MB).
    pub max_upload_size: usize,

    /// Content routing and record defaults.
    pub content: ContentConfig,
}

/// Content section of the configuration, handed to the content router.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Path segment the content routes live under (default: "content").
    pub base: String,

    /// Label for the content home page.
    pub home: String,

    /// Action path segments.
    pub actions: ContentActions,

    /// Message shown for an unknown type. `%type` is replaced by the slug.
    pub missing_message: String,

    /// Locale tag stamped on new records (default: "us-en").
    pub language: String,

    /// Timezone the sunrise/sunset form fields are entered in.
    pub timezone: Tz,
}

/// Action path segments for the add form and its submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContentActions {
    pub add: String,
    pub save: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base: "content".to_string(),
            home: "Content".to_string(),
            actions: ContentActions {
                add: "add".to_string(),
                save: "save".to_string(),
            },
            missing_message: "Content type %type not found".to_string(),
            language: "us-en".to_string(),
            timezone: chrono_tz::America::New_York,
        }
    }
}

impl ContentConfig {
    /// Load the content section from environment variables.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base = env::var("CONTENT_BASE")
            .map(|v| v.trim_matches('/').to_string())
            .unwrap_or(defaults.base);

        let home = env::var("CONTENT_HOME_LABEL").unwrap_or(defaults.home);

        let add = env::var("CONTENT_ACTION_ADD").unwrap_or(defaults.actions.add);
        let save = env::var("CONTENT_ACTION_SAVE").unwrap_or(defaults.actions.save);
        anyhow::ensure!(
            add != save,
            "CONTENT_ACTION_ADD and CONTENT_ACTION_SAVE must differ"
        );

        let missing_message =
            env::var("CONTENT_MISSING_MESSAGE").unwrap_or(defaults.missing_message);

        let language = env::var("CONTENT_LANGUAGE").unwrap_or(defaults.language);

        let timezone = match env::var("CONTENT_TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!(e))
                .with_context(|| format!("CONTENT_TIMEZONE '{name}' is not a known timezone"))?,
            Err(_) => defaults.timezone,
        };

        Ok(Self {
            base,
            home,
            actions: ContentActions { add, save },
            missing_message,
            language,
            timezone,
        })
    }

    /// Path of the content home page, e.g. `/content`.
    pub fn home_path(&self) -> String {
        format!("/{}", self.base)
    }

    /// Path of a type's landing page.
    pub fn landing_path(&self, type_slug: &str) -> String {
        format!("/{}/{}", self.base, urlencoding::encode(type_slug))
    }

    /// Path of a type's add form.
    pub fn add_path(&self, type_slug: &str) -> String {
        format!("{}/{}", self.landing_path(type_slug), self.actions.add)
    }

    /// Render the missing-type message for a requested slug.
    pub fn missing_message_for(&self, type_slug: &str) -> String {
        self.missing_message.replace("%type", type_slug)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let redis_url = env::var("REDIS_URL").ok().filter(|v| !v.is_empty());

        let cookie_same_site = env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "lax".to_string())
            .to_lowercase();

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        let templates_dir = env::var("TEMPLATES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./templates"));

        let content_types_dir = env::var("CONTENT_TYPES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./content-types"));

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public/uploads"));

        let max_upload_size = env::var("MAX_UPLOAD_SIZE")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse()
            .context("MAX_UPLOAD_SIZE must be a valid byte count")?;

        let content = ContentConfig::from_env()?;

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            redis_url,
            cookie_same_site,
            cookie_secure,
            templates_dir,
            content_types_dir,
            uploads_dir,
            max_upload_size,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_message_interpolates_slug() {
        let content = ContentConfig::default();
        assert_eq!(
            content.missing_message_for("unknowntype"),
            "Content type unknowntype not found"
        );
    }

    #[test]
    fn paths_are_built_under_base() {
        let content = ContentConfig::default();
        assert_eq!(content.home_path(), "/content");
        assert_eq!(content.landing_path("services"), "/content/services");
        assert_eq!(content.add_path("services"), "/content/services/add");
    }

    #[test]
    fn landing_path_encodes_slug() {
        let content = ContentConfig::default();
        assert_eq!(content.landing_path("a b"), "/content/a%20b");
    }
}
