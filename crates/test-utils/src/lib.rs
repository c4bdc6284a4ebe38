//! Punchcard test utilities.
//!
//! Helpers for integration testing: content type fixtures, a multipart body
//! builder, and assertion utilities for content route testing.

use uuid::Uuid;

/// Boundary used by [`MultipartBody`] unless another is given.
pub const DEFAULT_BOUNDARY: &str = "punchcard-test-boundary";

/// Create an author id for a test submission.
pub fn test_author() -> Uuid {
    Uuid::new_v4()
}

/// One part of a multipart body.
#[derive(Debug, Clone)]
enum Part {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

/// A `multipart/form-data` body builder.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBody {
    /// Create an empty body with the default boundary.
    pub fn new() -> Self {
        Self {
            boundary: DEFAULT_BOUNDARY.to_string(),
            parts: Vec::new(),
        }
    }

    /// Set a custom boundary.
    pub fn with_boundary(mut self, boundary: &str) -> Self {
        self.boundary = boundary.to_string();
        self
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(Part::Text {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Add several text fields.
    pub fn texts(self, fields: &[(&str, &str)]) -> Self {
        fields
            .iter()
            .fold(self, |body, (name, value)| body.text(name, value))
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.parts.push(Part::File {
            name: name.to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data: data.to_vec(),
        });
        self
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Encode the body.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for part in &self.parts {
            out.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Text { name, value } => {
                    out.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    out.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    out.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    out.extend_from_slice(data);
                }
            }
            out.extend_from_slice(b"\r\n");
        }

        out.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value equals expected.
    pub fn json_eq(actual: &Value, expected: &Value) {
        assert_eq!(
            actual, expected,
            "JSON mismatch:\nactual: {actual:#}\nexpected: {expected:#}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}

/// Content type definitions for testing, in the YAML/JSON shape the kernel loads.
pub mod content_types {
    use serde_json::json;

    /// A services type: required name, optional url and email, required select.
    pub fn services_type() -> serde_json::Value {
        json!({
            "id": "services",
            "name": "Services",
            "description": "Services offered to residents",
            "attributes": [
                {
                    "id": "service-name",
                    "name": "Service Name",
                    "required": true,
                    "inputs": [
                        { "id": "text", "type": "text", "label": "Name", "max_length": 64 }
                    ]
                },
                {
                    "id": "service-url",
                    "name": "Service URL",
                    "inputs": [
                        { "id": "url", "type": "url", "label": "URL" }
                    ]
                },
                {
                    "id": "contact",
                    "name": "Contact",
                    "inputs": [
                        { "id": "email", "type": "email", "label": "Email" }
                    ]
                },
                {
                    "id": "category",
                    "name": "Category",
                    "required": true,
                    "inputs": [
                        {
                            "id": "select",
                            "type": "select",
                            "label": "Category",
                            "options": [
                                { "value": "health", "label": "Health" },
                                { "value": "housing", "label": "Housing" }
                            ]
                        }
                    ]
                }
            ]
        })
    }

    /// An events type with a date, a time, and a file input.
    pub fn events_type() -> serde_json::Value {
        json!({
            "id": "events",
            "name": "Events",
            "attributes": [
                {
                    "id": "title",
                    "name": "Title",
                    "required": true,
                    "inputs": [
                        { "id": "text", "type": "text", "label": "Title" }
                    ]
                },
                {
                    "id": "starts",
                    "name": "Starts",
                    "inputs": [
                        { "id": "date", "type": "date", "label": "Date" },
                        { "id": "time", "type": "time", "label": "Time" }
                    ]
                },
                {
                    "id": "flyer",
                    "name": "Flyer",
                    "inputs": [
                        { "id": "file", "type": "file", "label": "Flyer" }
                    ]
                }
            ]
        })
    }

    /// Valid text fields for a services submission.
    pub fn services_fields() -> Vec<(&'static str, &'static str)> {
        vec![
            ("service-name--text", "Meals on Wheels"),
            ("service-url--url", "https://example.org/meals"),
            ("contact--email", "meals@example.org"),
            ("category--select", "health"),
        ]
    }
}
