//! Storage object events.

use std::fmt;

use csv2sheet_error::{Result, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Object finalized in a storage bucket.
///
/// Mirrors the subset of the storage object resource we care about. Size and
/// generation are strings in the JSON api since they're 64 bit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectEvent {
    pub bucket: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
}

impl StorageObjectEvent {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        StorageObjectEvent {
            bucket: bucket.into(),
            name: name.into(),
            content_type: None,
            size: None,
            generation: None,
        }
    }

    /// Parse an event from a request body.
    ///
    /// Accepts either the bare object (CloudEvents binary mode), or the object
    /// nested under a "data" key (structured CloudEvents and legacy background
    /// function payloads).
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(bytes).context("Event payload is not valid json")?;

        let value = match value {
            Value::Object(mut obj) => match obj.remove("data") {
                Some(data @ Value::Object(_)) => data,
                Some(other) => {
                    obj.insert("data".to_string(), other);
                    Value::Object(obj)
                }
                None => Value::Object(obj),
            },
            other => other,
        };

        serde_json::from_value(value).context("Event payload is not a storage object")
    }
}

impl fmt::Display for StorageObjectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gs://{}/{}", self.bucket, self.name)
    }
}
