//! Multipart form parsing and upload storage.
//!
//! A submission is parsed exactly once: text parts become form values and
//! file parts are written to the upload directory and described in the
//! values by their metadata.

use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::content::FormValues;
use crate::error::{AppError, AppResult};

/// Extra body allowance for the text parts of an upload request.
pub const FORM_OVERHEAD: usize = 1024 * 1024;

/// Directory uploaded files are written to.
#[derive(Debug, Clone)]
pub struct UploadDir {
    base_path: PathBuf,
    max_file_size: usize,
}

impl UploadDir {
    /// Create a new upload directory handle.
    pub fn new(base_path: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            base_path: base_path.into(),
            max_file_size,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Largest request body the save route accepts.
    pub fn body_limit(&self) -> usize {
        self.max_file_size.saturating_add(FORM_OVERHEAD)
    }

    /// Generate a relative path for a new file: `{yyyy}/{mm}/{8 hex}_{name}`.
    pub fn generate_path(&self, filename: &str) -> String {
        let now = chrono::Utc::now();
        let unique_id = uuid::Uuid::new_v4().simple().to_string();

        format!(
            "{}/{}/{}_{}",
            now.format("%Y"),
            now.format("%m"),
            &unique_id[..8],
            sanitize_filename(filename)
        )
    }

    /// Write a file and return its path relative to the upload directory.
    pub async fn store(&self, filename: &str, data: &[u8]) -> anyhow::Result<String> {
        let relative = self.generate_path(filename);
        let path = self.base_path.join(&relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create upload directories")?;
        }

        let mut file = fs::File::create(&path)
            .await
            .context("failed to create upload file")?;
        file.write_all(data)
            .await
            .context("failed to write upload file")?;
        file.flush().await.context("failed to flush upload file")?;

        debug!(path = %path.display(), size = data.len(), "upload written");
        Ok(relative)
    }

    /// Resolve a relative upload path, rejecting traversal.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = relative.trim_start_matches('/');
        let safe = Path::new(relative)
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        (safe && !relative.is_empty() && !relative.contains('\0'))
            .then(|| self.base_path.join(relative))
    }
}

/// Metadata of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// Form field the file was submitted under.
    #[serde(skip)]
    pub field: String,
    /// Name the client sent.
    pub filename: String,
    /// Path relative to the upload directory.
    pub path: String,
    pub content_type: Option<String>,
    pub size: usize,
}

/// A parsed multipart submission.
#[derive(Debug, Clone, Default)]
pub struct SubmittedForm {
    /// Text values, plus upload metadata under each file field.
    pub values: FormValues,
    pub files: Vec<UploadedFile>,
}

impl SubmittedForm {
    /// Parse a multipart body, storing file parts in `uploads`.
    ///
    /// Repeated field names collect into arrays. File parts without a name
    /// and content (an empty file input) are skipped.
    pub async fn from_multipart(mut multipart: Multipart, uploads: &UploadDir) -> AppResult<Self> {
        let mut form = SubmittedForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, uploads))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, uploads))?;

                    if filename.is_empty() && data.is_empty() {
                        continue;
                    }
                    if data.len() > uploads.max_file_size() {
                        return Err(AppError::PayloadTooLarge {
                            max: uploads.max_file_size(),
                        });
                    }

                    let path = uploads.store(&filename, &data).await?;
                    let file = UploadedFile {
                        field: name.clone(),
                        filename,
                        path,
                        content_type,
                        size: data.len(),
                    };
                    let meta = serde_json::to_value(&file).context("failed to describe upload")?;
                    push_value(&mut form.values, name, meta);
                    form.files.push(file);
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(e, uploads))?;
                    push_value(&mut form.values, name, Value::String(text));
                }
            }
        }

        for file in &form.files {
            info!(
                field = %file.field,
                filename = %file.filename,
                path = %file.path,
                size = file.size,
                "received upload"
            );
        }

        Ok(form)
    }
}

/// Insert a value, turning repeated names into arrays.
fn push_value(values: &mut FormValues, name: String, value: Value) {
    match values.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            values.insert(name, value);
        }
    }
}

fn multipart_error(err: MultipartError, uploads: &UploadDir) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge {
            max: uploads.max_file_size(),
        }
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Sanitize a client-supplied filename for storage.
pub fn sanitize_filename(filename: &str) -> String {
    // Clients may send a full path; keep the last component only
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();

    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_strips_paths_and_unsafe_chars() {
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename("C:\\Users\\me\\my photo.png"), "my_photo.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(".htaccess"), "htaccess");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn generated_paths_are_dated_and_unique() {
        let uploads = UploadDir::new("/tmp/uploads", 10);
        let a = uploads.generate_path("a b.txt");
        let b = uploads.generate_path("a b.txt");
        assert_ne!(a, b);
        assert!(a.ends_with("_a_b.txt"), "{a}");
        assert_eq!(a.split('/').count(), 3);
    }

    #[test]
    fn resolve_rejects_traversal() {
        let uploads = UploadDir::new("/srv/uploads", 10);
        assert_eq!(
            uploads.resolve("2024/01/abc_x.png"),
            Some(PathBuf::from("/srv/uploads/2024/01/abc_x.png"))
        );
        assert_eq!(uploads.resolve("../secret"), None);
        assert_eq!(uploads.resolve(""), None);
    }

    #[test]
    fn repeated_names_become_arrays() {
        let mut values = FormValues::new();
        push_value(&mut values, "tag".into(), json!("a"));
        push_value(&mut values, "tag".into(), json!("b"));
        push_value(&mut values, "tag".into(), json!("c"));
        push_value(&mut values, "name".into(), json!("x"));
        assert_eq!(values["tag"], json!(["a", "b", "c"]));
        assert_eq!(values["name"], json!("x"));
    }

    #[tokio::test]
    async fn store_writes_under_base() {
        let base = std::env::temp_dir().join(format!("punchcard-uploads-{}", uuid::Uuid::new_v4()));
        let uploads = UploadDir::new(&base, 1024);

        let relative = uploads.store("hello.txt", b"hi there").await.unwrap();
        let written = tokio::fs::read(base.join(&relative)).await.unwrap();
        assert_eq!(written, b"hi there");

        tokio::fs::remove_dir_all(&base).await.ok();
    }
}
