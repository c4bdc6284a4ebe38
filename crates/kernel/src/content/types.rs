//! Content type definitions.
//!
//! A content type is a named schema made of attributes, each of which has one
//! or more inputs. Definitions are loaded from YAML at startup.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between attribute id and input id in submitted field names.
pub const FIELD_SEPARATOR: &str = "--";

/// A content type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentType {
    /// Slug used in URLs and table names. Derived from `name` when omitted.
    #[serde(default)]
    pub id: String,

    /// Human-readable name.
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Ordered attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// One attribute of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// All inputs of a required attribute must be filled in.
    #[serde(default)]
    pub required: bool,

    pub inputs: Vec<Input>,
}

/// A single form input belonging to an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: InputKind,

    pub label: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Allowed values for select inputs, as (value, label) pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,

    /// Current value (filled in when merging prior submissions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Input widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Text,
    Textarea,
    Email,
    Url,
    Number,
    Date,
    Time,
    Select,
    Checkbox,
    File,
}

impl InputKind {
    /// HTML `type` attribute for `<input>` based kinds.
    pub fn html_type(self) -> &'static str {
        match self {
            InputKind::Text | InputKind::Textarea | InputKind::Select => "text",
            InputKind::Email => "email",
            InputKind::Url => "url",
            InputKind::Number => "number",
            InputKind::Date => "date",
            InputKind::Time => "time",
            InputKind::Checkbox => "checkbox",
            InputKind::File => "file",
        }
    }
}

/// A select option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl ContentType {
    /// Iterate over every input with its submitted field name.
    pub fn fields(&self) -> impl Iterator<Item = (String, &Attribute, &Input)> {
        self.attributes.iter().flat_map(|attr| {
            attr.inputs
                .iter()
                .map(move |input| (field_name(&attr.id, &input.id), attr, input))
        })
    }

    /// Whether any input accepts file uploads.
    pub fn has_files(&self) -> bool {
        self.fields()
            .any(|(_, _, input)| input.kind == InputKind::File)
    }
}

/// Submitted field name for an attribute input.
pub fn field_name(attribute_id: &str, input_id: &str) -> String {
    format!("{attribute_id}{FIELD_SEPARATOR}{input_id}")
}

/// Lowercase, dash-separated slug of a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Services"), "services");
        assert_eq!(slugify("  Press Release!! 2 "), "press-release-2");
        assert_eq!(slugify("a__b"), "a-b");
    }

    #[test]
    fn field_names_join_attribute_and_input() {
        assert_eq!(field_name("service-name", "text"), "service-name--text");
    }

    #[test]
    fn input_kind_deserializes_lowercase() {
        let kind: InputKind = serde_json::from_str("\"textarea\"").unwrap();
        assert_eq!(kind, InputKind::Textarea);
        assert_eq!(InputKind::Email.html_type(), "email");
    }
}
