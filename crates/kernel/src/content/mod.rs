//! Content management module.
//!
//! This module provides:
//! - ContentTypeRegistry: content type definitions loaded from YAML
//! - normalize/only: merging prior submissions back into a definition
//! - FormBuilder: add form markup with inline validation errors
//! - validate: submission checks against a definition
//! - ContentRecord: the row persisted for each accepted submission

use std::collections::BTreeMap;

mod form;
mod merge;
mod record;
pub mod time;
mod type_registry;
pub mod types;
mod validate;

pub use form::{FormBuilder, FormError, RenderedForm, build as build_form};
pub use merge::{CORE_BUCKET, MergedType, NormalizedValues, normalize, only};
pub use record::{ContentRecord, TABLE_PREFIX, table_name};
pub use time::{PublishWindow, TimeError};
pub use type_registry::ContentTypeRegistry;
pub use types::{Attribute, ContentType, Input, InputKind, SelectOption};
pub use validate::{ValidationErrors, validate};

/// Submitted form values keyed by field name.
pub type FormValues = BTreeMap<String, serde_json::Value>;
