use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of data. Field order is insertion order and is preserved through
/// serialization, so CSV headers and JSON payloads follow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Inserts or replaces a field. A replaced field keeps its original position.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.data.insert(field.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.data.values()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Ordered `output_field -> native_field` pairs.
pub type FieldMapping = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSource {
    pub url: String,
    #[serde(alias = "mapping")]
    pub field_mapping: FieldMapping,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSource {
    #[serde(alias = "file_path")]
    pub path: String,
    #[serde(alias = "mapping")]
    pub field_mapping: FieldMapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SourceDescriptor {
    #[serde(rename = "api")]
    Api(ApiSource),
    #[serde(rename = "csv")]
    File(FileSource),
}

impl SourceDescriptor {
    pub fn field_mapping(&self) -> &FieldMapping {
        match self {
            SourceDescriptor::Api(source) => &source.field_mapping,
            SourceDescriptor::File(source) => &source.field_mapping,
        }
    }

    /// URL or path, for log lines and summaries.
    pub fn location(&self) -> &str {
        match self {
            SourceDescriptor::Api(source) => &source.url,
            SourceDescriptor::File(source) => &source.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDestination {
    #[serde(alias = "file_path")]
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDestination {
    pub url: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DestinationDescriptor {
    #[serde(rename = "csv")]
    File(FileDestination),
    #[serde(rename = "api")]
    Api(ApiDestination),
}

impl DestinationDescriptor {
    pub fn location(&self) -> &str {
        match self {
            DestinationDescriptor::File(destination) => &destination.path,
            DestinationDescriptor::Api(destination) => &destination.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_insertion_order() {
        let mut record = Record::new();
        record.insert("zeta", json!(1));
        record.insert("alpha", json!(2));
        record.insert("zeta", json!(3));

        let keys: Vec<&String> = record.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(record.get("zeta"), Some(&json!(3)));
    }

    #[test]
    fn test_record_serializes_as_plain_object() {
        let record: Record = vec![("id", json!(1)), ("name", json!("Ann"))]
            .into_iter()
            .collect();
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"id":1,"name":"Ann"}"#);
    }

    #[test]
    fn test_source_descriptor_from_json_tag() {
        let source: SourceDescriptor = serde_json::from_value(json!({
            "type": "csv",
            "file_path": "data.csv",
            "mapping": {"id": "user_id", "name": "user_name"}
        }))
        .unwrap();

        match &source {
            SourceDescriptor::File(file) => assert_eq!(file.path, "data.csv"),
            other => panic!("unexpected source: {:?}", other),
        }
        let pairs: Vec<(&String, &String)> = source.field_mapping().iter().collect();
        assert_eq!(pairs[0], (&"id".to_string(), &"user_id".to_string()));
        assert_eq!(pairs[1], (&"name".to_string(), &"user_name".to_string()));
    }
}
