//! Persisted content records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FormValues;

/// Prefix of per-type record tables.
pub const TABLE_PREFIX: &str = "content-type--";

/// Table holding records of a content type.
pub fn table_name(type_slug: &str) -> String {
    format!("{TABLE_PREFIX}{}", type_slug.to_lowercase())
}

/// One submission of a content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: Uuid,
    pub language: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub approval: i32,
    pub publishable: bool,
    pub value: serde_json::Value,
    pub author: Uuid,
}

impl ContentRecord {
    /// Create a fresh, unapproved record for a submission.
    pub fn new(
        value: &FormValues,
        author: Uuid,
        language: impl Into<String>,
        sunrise: Option<DateTime<Utc>>,
        sunset: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            language: language.into(),
            sunrise,
            sunset,
            approval: 0,
            publishable: false,
            value: serde_json::Value::Object(
                value.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ),
            author,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_name_is_lowercased() {
        assert_eq!(table_name("Services"), "content-type--services");
    }

    #[test]
    fn new_records_start_unapproved() {
        let mut values = FormValues::new();
        values.insert("name--text".into(), json!("Ada"));
        let author = Uuid::new_v4();

        let a = ContentRecord::new(&values, author, "us-en", None, None);
        let b = ContentRecord::new(&values, author, "us-en", None, None);

        assert_eq!(a.approval, 0);
        assert!(!a.publishable);
        assert_eq!(a.author, author);
        assert_eq!(a.value, json!({"name--text": "Ada"}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn timestamps_serialize_as_iso() {
        let sunrise = "2024-01-01T13:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let record = ContentRecord::new(&FormValues::new(), Uuid::nil(), "us-en", Some(sunrise), None);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sunrise"], json!("2024-01-01T13:00:00Z"));
        assert_eq!(json["sunset"], json!(null));
    }
}
