//! Submission validation against a content type.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use serde_json::Value;

use super::FormValues;
use super::time::{self, PublishWindow, SUNRISE_DATE, SUNRISE_TIME, SUNSET_DATE, SUNSET_TIME, TimeError};
use super::types::{ContentType, Input, InputKind};

/// Field name to error message. Only the first problem per field is kept.
pub type ValidationErrors = BTreeMap<String, String>;

/// Validate a submitted body against a content type.
pub fn validate(body: &FormValues, content_type: &ContentType, tz: Tz) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    for (field, attr, input) in content_type.fields() {
        let value = body.get(&field);

        if is_blank(value) {
            if attr.required {
                errors.insert(field, format!("{} is required", input.label));
            }
            continue;
        }

        if let Some(message) = value.and_then(|v| check_input(input, v)) {
            errors.insert(field, message);
        }
    }

    check_window(body, tz, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.iter().all(|v| is_blank(Some(v))),
        Some(_) => false,
    }
}

/// Textual values of a submitted field; repeated fields yield several.
fn texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items.iter().flat_map(texts).collect(),
        Value::Null | Value::Object(_) => vec![],
    }
}

fn is_upload(value: &Value) -> bool {
    value.get("filename").and_then(Value::as_str).is_some()
}

fn check_input(input: &Input, value: &Value) -> Option<String> {
    let label = &input.label;

    if input.kind == InputKind::File {
        let uploads_only = match value {
            Value::Array(items) => items.iter().all(is_upload),
            other => is_upload(other),
        };
        return (!uploads_only).then(|| format!("{label} must be an uploaded file"));
    }

    if matches!(value, Value::Object(_)) {
        return Some(format!("{label} must be text"));
    }

    for text in texts(value) {
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some(max) = input.max_length {
            if text.chars().count() > max {
                return Some(format!("{label} must be at most {max} characters"));
            }
        }

        let ok = match input.kind {
            InputKind::Email => is_email(text),
            InputKind::Url => is_url(text),
            InputKind::Number => text.parse::<f64>().is_ok_and(f64::is_finite),
            InputKind::Date => time::parse_date(text).is_ok(),
            InputKind::Time => time::parse_time(text).is_ok(),
            InputKind::Select => input.options.iter().any(|o| o.value == text),
            InputKind::Text | InputKind::Textarea | InputKind::Checkbox | InputKind::File => true,
        };

        if !ok {
            return Some(match input.kind {
                InputKind::Email => format!("{label} must be a valid email address"),
                InputKind::Url => format!("{label} must be a valid URL"),
                InputKind::Number => format!("{label} must be a number"),
                InputKind::Date => format!("{label} must be a date (YYYY-MM-DD)"),
                InputKind::Time => format!("{label} must be a time (HH:MM)"),
                InputKind::Select => format!("{label} must be one of the listed options"),
                _ => format!("{label} is invalid"),
            });
        }
    }

    None
}

fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !text.contains(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Absolute http(s) URL with a host. The parser trims and re-encodes
/// whitespace, so raw whitespace is rejected up front.
fn is_url(text: &str) -> bool {
    if text.contains(char::is_whitespace) {
        return false;
    }
    match url::Url::parse(text) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}

fn window_error_key(err: &TimeError, date_key: &'static str, time_key: &'static str) -> &'static str {
    match err {
        TimeError::InvalidTime(_) => time_key,
        TimeError::InvalidDate(_) | TimeError::Nonexistent(_) => date_key,
    }
}

fn check_window(body: &FormValues, tz: Tz, errors: &mut ValidationErrors) {
    // Repeated fields arrive as arrays and would otherwise read as absent
    for key in [SUNRISE_DATE, SUNRISE_TIME, SUNSET_DATE, SUNSET_TIME] {
        if body.get(key).is_some_and(|v| !v.is_string() && !v.is_null()) {
            errors
                .entry(key.to_string())
                .or_insert_with(|| "Must be a single value".to_string());
        }
    }

    let window = PublishWindow::from_values(body);

    let sunrise = window.sunrise(tz).map_err(|e| {
        let key = window_error_key(&e, SUNRISE_DATE, SUNRISE_TIME);
        errors.entry(key.to_string()).or_insert(format!("Sunrise: {e}"));
    });
    let sunset = window.sunset(tz).map_err(|e| {
        let key = window_error_key(&e, SUNSET_DATE, SUNSET_TIME);
        errors.entry(key.to_string()).or_insert(format!("Sunset: {e}"));
    });

    if let (Ok(Some(sunrise)), Ok(Some(sunset))) = (sunrise, sunset) {
        if sunset <= sunrise {
            errors
                .entry(SUNSET_DATE.to_string())
                .or_insert_with(|| "Sunset must be after sunrise".to_string());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::content::types::{Attribute, SelectOption};
    use chrono_tz::America::New_York;
    use serde_json::json;

    fn input(id: &str, kind: InputKind) -> Input {
        Input {
            id: id.into(),
            kind,
            label: id.to_uppercase(),
            placeholder: None,
            max_length: None,
            options: vec![],
            value: None,
        }
    }

    fn contact() -> ContentType {
        let mut name = input("text", InputKind::Text);
        name.max_length = Some(10);
        let mut level = input("select", InputKind::Select);
        level.options = vec![SelectOption {
            value: "gold".into(),
            label: "Gold".into(),
        }];

        ContentType {
            id: "contact".into(),
            name: "Contact".into(),
            description: String::new(),
            attributes: vec![
                Attribute {
                    id: "name".into(),
                    name: "Name".into(),
                    description: None,
                    required: true,
                    inputs: vec![name],
                },
                Attribute {
                    id: "email".into(),
                    name: "Email".into(),
                    description: None,
                    required: false,
                    inputs: vec![input("email", InputKind::Email)],
                },
                Attribute {
                    id: "site".into(),
                    name: "Site".into(),
                    description: None,
                    required: false,
                    inputs: vec![input("url", InputKind::Url)],
                },
                Attribute {
                    id: "level".into(),
                    name: "Level".into(),
                    description: None,
                    required: false,
                    inputs: vec![level],
                },
                Attribute {
                    id: "photo".into(),
                    name: "Photo".into(),
                    description: None,
                    required: false,
                    inputs: vec![input("file", InputKind::File)],
                },
            ],
        }
    }

    fn body(pairs: &[(&str, Value)]) -> FormValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn valid_submission_passes() {
        let body = body(&[
            ("name--text", json!("Ada")),
            ("email--email", json!("ada@example.org")),
            ("site--url", json!("https://example.org/about")),
            ("level--select", json!("gold")),
            ("photo--file", json!({"filename": "a.png", "path": "x", "size": 1})),
            ("sunrise-date", json!("2024-01-01")),
            ("sunrise-time", json!("08:00")),
            ("sunset-date", json!("2024-01-01")),
            ("sunset-time", json!("20:00")),
        ]);
        assert_eq!(validate(&body, &contact(), New_York), Ok(()));
    }

    #[test]
    fn required_attribute_must_be_filled() {
        let errors = validate(&body(&[("name--text", json!("  "))]), &contact(), New_York).unwrap_err();
        assert_eq!(errors["name--text"], "TEXT is required");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn shapes_are_checked() {
        let body = body(&[
            ("name--text", json!("A name that is too long")),
            ("email--email", json!("not-an-email")),
            ("site--url", json!("ftp://example.org")),
            ("level--select", json!("platinum")),
            ("photo--file", json!("c:/fake.png")),
        ]);
        let errors = validate(&body, &contact(), New_York).unwrap_err();
        assert!(errors["name--text"].contains("at most 10"));
        assert!(errors["email--email"].contains("email"));
        assert!(errors["site--url"].contains("URL"));
        assert!(errors["level--select"].contains("options"));
        assert!(errors["photo--file"].contains("uploaded file"));
    }

    #[test]
    fn sunset_must_follow_sunrise() {
        let body = body(&[
            ("name--text", json!("Ada")),
            ("sunrise-date", json!("2024-01-02")),
            ("sunset-date", json!("2024-01-01")),
        ]);
        let errors = validate(&body, &contact(), New_York).unwrap_err();
        assert_eq!(errors[SUNSET_DATE], "Sunset must be after sunrise");
    }

    #[test]
    fn repeated_window_fields_are_rejected() {
        let body = body(&[
            ("name--text", json!("Ada")),
            ("sunrise-date", json!(["2024-01-01", "2024-01-02"])),
            ("sunset-time", json!(["10:00", "11:00"])),
        ]);
        let errors = validate(&body, &contact(), New_York).unwrap_err();
        assert_eq!(errors[SUNRISE_DATE], "Must be a single value");
        assert_eq!(errors[SUNSET_TIME], "Must be a single value");
    }

    #[test]
    fn malformed_window_fields_are_reported_per_field() {
        let body = body(&[
            ("name--text", json!("Ada")),
            ("sunrise-date", json!("2024-01-01")),
            ("sunrise-time", json!("noon")),
            ("sunset-date", json!("tomorrow")),
        ]);
        let errors = validate(&body, &contact(), New_York).unwrap_err();
        assert!(errors.contains_key(SUNRISE_TIME));
        assert!(errors.contains_key(SUNSET_DATE));
    }

    #[test]
    fn email_and_url_helpers() {
        assert!(is_email("a@b.co"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a b@c.de"));
        assert!(!is_email("@c.de"));
        assert!(is_url("http://localhost:3000/x"));
        assert!(is_url("https://example.org/a?b=c#d"));
        assert!(!is_url("https://"));
    }

    #[test]
    fn url_rejects_malformed_hosts() {
        assert!(!is_url("http://%%%"));
        assert!(!is_url("http://["));
        assert!(!is_url("https://exa<mple>.org"));
        assert!(!is_url("https://exa mple.org"));
    }

    #[test]
    fn url_requires_web_scheme() {
        assert!(!is_url("ftp://example.org/file"));
        assert!(!is_url("mailto:someone@example.org"));
        assert!(!is_url("example.org"));
    }
}
