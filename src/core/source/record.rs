//! Records read from the source index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single hit from the source index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Identifier assigned by the source index
    #[serde(rename = "_id")]
    pub id: String,
    /// Stored fields of the record
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>, source: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }

    /// Build a record from a JSON object literal. Non-object values yield an
    /// empty source.
    pub fn from_json(id: impl Into<String>, source: Value) -> Self {
        let source = match source {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(id, source)
    }

    /// Look up a field by dotted path. `_id` resolves to the record identifier.
    pub fn field(&self, path: &str) -> Option<Value> {
        if path == "_id" {
            return Some(Value::String(self.id.clone()));
        }

        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.source.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_hit() {
        let hit = json!({
            "_index": "articles",
            "_id": "abc",
            "_score": 1.0,
            "_source": {"body": "text", "year": 2020}
        });
        let record: SourceRecord = serde_json::from_value(hit).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.source["year"], json!(2020));
    }

    #[test]
    fn test_field_lookup() {
        let record = SourceRecord::from_json("r1", json!({"a": {"b": 3}, "c": "x"}));
        assert_eq!(record.field("_id"), Some(json!("r1")));
        assert_eq!(record.field("a.b"), Some(json!(3)));
        assert_eq!(record.field("c"), Some(json!("x")));
        assert_eq!(record.field("a.missing"), None);
        assert_eq!(record.field("c.deeper"), None);
    }
}
