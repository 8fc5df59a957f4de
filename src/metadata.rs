use serde_json::{Map, Value};

use crate::errors::DatasetError;
use crate::types::{Keyword, SectionName, Severity};

/// Canonical identifier for metadata fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataKey {
    name: &'static str,
}

impl MetadataKey {
    /// Create a metadata key with a canonical static name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Return the raw key name.
    pub const fn as_str(&self) -> &'static str {
        self.name
    }

    /// Read this key from a JSON object, if present.
    pub fn get<'a>(&self, object: &'a Map<String, Value>) -> Option<&'a Value> {
        object.get(self.name)
    }
}

/// Keywords matched by the keyword-search labeler.
pub const META_KEYWORDS_FOUND: MetadataKey = MetadataKey::new("keywords_found");
/// Severity assigned by the keyword-search labeler (annotated records only).
pub const META_KEYWORD_SEARCH_SEVERITY: MetadataKey =
    MetadataKey::new("keyword_search_edema_severity");
/// Report sections that contributed to `original_report`.
pub const META_ORIGIN_SECTION: MetadataKey = MetadataKey::new("origin_section");

const KNOWN_KEYS: [MetadataKey; 3] = [
    META_KEYWORDS_FOUND,
    META_KEYWORD_SEARCH_SEVERITY,
    META_ORIGIN_SECTION,
];

/// Per-record metadata that accumulates fields across pipeline stages.
///
/// Ingestion sets `keywords_found` (and `keyword_search_edema_severity` for
/// annotated rows); the merger adds `origin_section`. Keys this crate does not
/// know are carried in `extra` so tables written elsewhere round-trip intact.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordMetadata {
    pub keywords_found: Vec<Keyword>,
    pub keyword_search_edema_severity: Option<Severity>,
    pub origin_section: Option<Vec<SectionName>>,
    pub extra: Map<String, Value>,
}

impl RecordMetadata {
    /// Metadata with only the keyword list set.
    pub fn with_keywords(keywords_found: Vec<Keyword>) -> Self {
        Self {
            keywords_found,
            ..Self::default()
        }
    }

    /// Attach the keyword-search severity.
    pub fn with_keyword_search_severity(mut self, severity: Severity) -> Self {
        self.keyword_search_edema_severity = Some(severity);
        self
    }

    /// Attach extraction provenance.
    pub fn with_origin_section(mut self, origin_section: Vec<SectionName>) -> Self {
        self.origin_section = Some(origin_section);
        self
    }

    /// Encode as a JSON object, known keys first in stage order.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            META_KEYWORDS_FOUND.as_str().to_string(),
            Value::from(self.keywords_found.clone()),
        );
        if let Some(severity) = self.keyword_search_edema_severity {
            object.insert(
                META_KEYWORD_SEARCH_SEVERITY.as_str().to_string(),
                Value::from(severity),
            );
        }
        if let Some(origin) = &self.origin_section {
            object.insert(
                META_ORIGIN_SECTION.as_str().to_string(),
                Value::from(origin.clone()),
            );
        }
        for (key, value) in &self.extra {
            object.insert(key.clone(), value.clone());
        }
        Value::Object(object)
    }

    /// Decode from a JSON object produced by [`RecordMetadata::to_json`] or an external writer.
    pub fn from_json(value: Value) -> Result<Self, DatasetError> {
        let Value::Object(object) = value else {
            return Err(malformed("metadata must be a JSON object"));
        };

        let keywords_found = match META_KEYWORDS_FOUND.get(&object) {
            Some(value) => string_list(value, META_KEYWORDS_FOUND)?,
            None => Vec::new(),
        };
        let keyword_search_edema_severity = match META_KEYWORD_SEARCH_SEVERITY.get(&object) {
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                malformed(format!(
                    "'{}' must be an integer",
                    META_KEYWORD_SEARCH_SEVERITY.as_str()
                ))
            })?),
            None => None,
        };
        let origin_section = match META_ORIGIN_SECTION.get(&object) {
            Some(value) => Some(string_list(value, META_ORIGIN_SECTION)?),
            None => None,
        };
        let extra = object
            .into_iter()
            .filter(|(key, _)| !KNOWN_KEYS.iter().any(|known| known.as_str() == key))
            .collect();

        Ok(Self {
            keywords_found,
            keyword_search_edema_severity,
            origin_section,
            extra,
        })
    }
}

fn string_list(value: &Value, key: MetadataKey) -> Result<Vec<String>, DatasetError> {
    let invalid = || malformed(format!("'{}' must be a list of strings", key.as_str()));
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn malformed(reason: impl Into<String>) -> DatasetError {
    DatasetError::Malformed {
        location: "metadata".to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_key_new_and_as_str_work() {
        const CUSTOM: MetadataKey = MetadataKey::new("custom");
        assert_eq!(CUSTOM.as_str(), "custom");

        let object = json!({"custom": 42});
        let object = object.as_object().unwrap();
        assert_eq!(CUSTOM.get(object), Some(&json!(42)));
        assert_eq!(META_ORIGIN_SECTION.get(object), None);
    }

    #[test]
    fn builder_accumulates_stage_fields_in_order() {
        let metadata = RecordMetadata::with_keywords(vec!["edema".into()])
            .with_keyword_search_severity(2)
            .with_origin_section(vec!["finding".into()]);

        let encoded = serde_json::to_string(&metadata.to_json()).unwrap();
        assert_eq!(
            encoded,
            r#"{"keywords_found":["edema"],"keyword_search_edema_severity":2,"origin_section":["finding"]}"#
        );
    }

    #[test]
    fn from_json_keeps_unknown_keys() {
        let value = json!({
            "keywords_found": ["effusion"],
            "reviewer": {"initials": "GC", "pass": 2}
        });
        let metadata = RecordMetadata::from_json(value.clone()).unwrap();
        assert_eq!(metadata.keywords_found, vec!["effusion".to_string()]);
        assert_eq!(metadata.keyword_search_edema_severity, None);
        assert_eq!(metadata.origin_section, None);
        assert_eq!(metadata.extra.len(), 1);
        assert_eq!(metadata.to_json(), value);
    }

    #[test]
    fn empty_origin_section_is_distinct_from_missing() {
        let metadata = RecordMetadata::default().with_origin_section(Vec::new());
        let decoded = RecordMetadata::from_json(metadata.to_json()).unwrap();
        assert_eq!(decoded.origin_section, Some(Vec::new()));
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn from_json_rejects_wrong_shapes() {
        assert!(matches!(
            RecordMetadata::from_json(json!(["not", "an", "object"])),
            Err(DatasetError::Malformed { .. })
        ));
        assert!(matches!(
            RecordMetadata::from_json(json!({"keywords_found": "edema"})),
            Err(DatasetError::Malformed { ref reason, .. }) if reason.contains("keywords_found")
        ));
        assert!(matches!(
            RecordMetadata::from_json(json!({"keyword_search_edema_severity": "2"})),
            Err(DatasetError::Malformed { ref reason, .. }) if reason.contains("integer")
        ));
    }
}
