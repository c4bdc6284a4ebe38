//! Take-once session values.
//!
//! Flash values are written by one request and consumed by the next render
//! of the page they belong to. Reading a value removes it from the session.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::content::{FormValues, ValidationErrors};

/// What a flash value is for. Each purpose has its own session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashPurpose {
    /// Notice about a content type that does not exist.
    MissingType,
    /// Errors and values of a rejected add-form submission.
    ContentAdd,
}

impl FlashPurpose {
    /// Session key the value is stored under.
    pub fn key(self) -> &'static str {
        match self {
            FlashPurpose::MissingType => "404",
            FlashPurpose::ContentAdd => "form.content.add",
        }
    }
}

/// Notice left for the not-found page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTypeNotice {
    pub message: String,
    /// Path the user can safely go back to.
    pub safe: String,
}

/// A rejected add-form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddFormState {
    /// Content type the submission was for.
    #[serde(rename = "type")]
    pub type_id: String,
    pub errors: ValidationErrors,
    pub content: FormValues,
}

/// Take-once store over a request's session.
pub struct Flash<'a> {
    session: &'a Session,
}

impl<'a> Flash<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Store a value, replacing any unread value for the same purpose.
    pub async fn put<T: Serialize>(&self, purpose: FlashPurpose, value: &T) -> Result<(), SessionError> {
        self.session.insert(purpose.key(), value).await
    }

    /// Read and remove the value for a purpose.
    pub async fn take<T: DeserializeOwned>(&self, purpose: FlashPurpose) -> Result<Option<T>, SessionError> {
        self.session.remove(purpose.key()).await
    }
}
