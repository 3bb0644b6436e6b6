//! Host records and the documents built from them
//!
//! Records arrive as arbitrary JSON objects. Text is taken from the first
//! non-empty of `text`, `answer` and `insight`; failing that, the whole record
//! is stringified.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Text fields checked in order before falling back to the JSON form
const TEXT_FIELDS: [&str; 3] = ["text", "answer", "insight"];

/// Document type used when a record names none
pub const DEFAULT_DOC_TYPE: &str = "response";

/// Metadata stored alongside every indexed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Document type (e.g. "response", "metric")
    #[serde(rename = "type")]
    pub doc_type: String,

    /// Id of the host object the document was built from
    pub source_id: String,

    /// Milliseconds since the Unix epoch (0 when unknown)
    pub timestamp: u64,

    /// Responses represented by the document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u64>,

    /// Remaining host metadata, carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An embedded record owned by the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    /// Document id
    pub id: String,
    /// Extracted text
    pub text: String,
    /// Fixed-dimension embedding
    pub embedding: Vec<f32>,
    /// Document metadata
    pub metadata: DocumentMetadata,
}

/// A record with its text and metadata extracted, ready to embed
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    /// Document id
    pub id: String,
    /// Extracted text
    pub text: String,
    /// Document metadata
    pub metadata: DocumentMetadata,
}

impl PreparedRecord {
    /// Extract id, text and metadata from a host record
    ///
    /// `position` is the record's index in its batch and names records that
    /// carry no id.
    pub fn from_record(record: &Value, position: usize) -> Self {
        let id = record
            .get("id")
            .and_then(id_string)
            .unwrap_or_else(|| format!("record-{}", position));

        let nested = record.get("metadata").and_then(Value::as_object);

        let doc_type = record
            .get("type")
            .and_then(Value::as_str)
            .or_else(|| nested.and_then(|m| m.get("type")).and_then(Value::as_str))
            .unwrap_or(DEFAULT_DOC_TYPE)
            .to_string();

        let source_id = record
            .get("sourceId")
            .and_then(id_string)
            .unwrap_or_else(|| id.clone());

        let timestamp = record.get("timestamp").and_then(as_count).unwrap_or(0);

        let sample_size = record
            .get("sampleSize")
            .or_else(|| record.get("sample_size"))
            .and_then(as_count);

        let extra = nested
            .map(|m| {
                m.iter()
                    .filter(|(k, _)| k.as_str() != "type")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            text: extract_text(record),
            metadata: DocumentMetadata {
                doc_type,
                source_id,
                timestamp,
                sample_size,
                extra,
            },
        }
    }

    /// Attach an embedding
    pub fn into_document(self, embedding: Vec<f32>) -> VectorDocument {
        VectorDocument {
            id: self.id,
            text: self.text,
            embedding,
            metadata: self.metadata,
        }
    }
}

/// Extract the textual payload of a record
pub fn extract_text(record: &Value) -> String {
    if let Value::String(s) = record {
        if !s.is_empty() {
            return s.clone();
        }
    }

    TEXT_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| record.to_string())
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
}
