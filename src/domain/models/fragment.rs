//! Fragment domain model
//!
//! A fragment is the unit of retrievable text: a chunk of a document, a
//! rendered telemetry record, or a remembered SQL example.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// A scalar metadata value attached to a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl MetadataValue {
    /// Convert a JSON value, ignoring anything that is not a scalar.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    /// Numeric view of the value. Strings are parsed; booleans never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.trim().parse::<f64>().ok(),
            Self::Bool(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for MetadataValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Field name to scalar value.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Build metadata from a JSON object, skipping non-scalar members.
pub fn metadata_from_json(object: &serde_json::Map<String, serde_json::Value>) -> Metadata {
    object
        .iter()
        .filter_map(|(k, v)| MetadataValue::from_json(v).map(|mv| (k.clone(), mv)))
        .collect()
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A unit of retrievable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Unique identifier, generated at creation
    pub id: String,

    /// Normalized, non-empty text
    pub text: String,

    /// Scalar metadata used for filtering
    #[serde(default)]
    pub metadata: Metadata,
}

impl Fragment {
    /// Create a fragment with a generated id.
    pub fn new(text: &str, metadata: Metadata) -> DomainResult<Self> {
        Self::with_id(Uuid::new_v4().to_string(), text, metadata)
    }

    /// Create a fragment with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, text: &str, metadata: Metadata) -> DomainResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::Validation("fragment id cannot be empty".to_string()));
        }

        let text = normalize_whitespace(text);
        if text.is_empty() {
            return Err(DomainError::Validation(
                "fragment text cannot be empty".to_string(),
            ));
        }

        Ok(Self { id, text, metadata })
    }

    /// Get a preview of the text (first 80 chars)
    pub fn preview(&self) -> String {
        if self.text.chars().count() <= 80 {
            self.text.clone()
        } else {
            let head: String = self.text.chars().take(80).collect();
            format!("{head}...")
        }
    }
}
