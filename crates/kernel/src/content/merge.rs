//! Merging submitted values back into content type definitions.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use super::time::PublishWindow;
use super::types::{ContentType, FIELD_SEPARATOR, InputKind};
use super::{FormError, FormValues};

/// Bucket for submitted keys that do not belong to an attribute.
pub const CORE_BUCKET: &str = "core";

/// Values grouped as `attribute id -> input id -> value`.
pub type NormalizedValues = BTreeMap<String, BTreeMap<String, Value>>;

/// Group flat `{attribute}--{input}` keys by attribute.
///
/// Keys without the separator land in the [`CORE_BUCKET`].
pub fn normalize(values: &FormValues) -> NormalizedValues {
    let mut normalized = NormalizedValues::new();

    for (key, value) in values {
        let (attribute, input) = match key.split_once(FIELD_SEPARATOR) {
            Some((attr, input)) if !attr.is_empty() && !input.is_empty() => (attr, input),
            _ => (CORE_BUCKET, key.as_str()),
        };

        normalized
            .entry(attribute.to_string())
            .or_default()
            .insert(input.to_string(), value.clone());
    }

    normalized
}

/// A content type with prior values filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedType {
    pub content_type: ContentType,
    pub window: PublishWindow,
}

/// Select the type matching `slug` and fill its inputs from `values`.
///
/// Select values outside the declared options are dropped rather than shown.
pub fn only(
    slug: &str,
    values: &NormalizedValues,
    types: &[ContentType],
) -> Result<MergedType, FormError> {
    let slug_lower = slug.to_lowercase();
    let mut content_type = types
        .iter()
        .find(|t| t.id == slug_lower)
        .cloned()
        .ok_or_else(|| FormError::UnknownType(slug.to_string()))?;

    for attr in &mut content_type.attributes {
        let Some(submitted) = values.get(&attr.id) else {
            continue;
        };

        for input in &mut attr.inputs {
            let Some(value) = submitted.get(&input.id) else {
                continue;
            };

            if input.kind == InputKind::Select {
                let known = value
                    .as_str()
                    .is_some_and(|v| input.options.iter().any(|o| o.value == v));
                if !known {
                    debug!(attribute = %attr.id, input = %input.id, "dropping unknown select value");
                    continue;
                }
            }

            input.value = Some(value.clone());
        }
    }

    let window = values
        .get(CORE_BUCKET)
        .map(PublishWindow::from_values)
        .unwrap_or_default();

    Ok(MergedType {
        content_type,
        window,
    })
}
