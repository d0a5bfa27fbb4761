//! Index profiles
//!
//! One retrieval pipeline serves every use case; a profile tells it which
//! index to talk to, where the fragment text lives in the metadata and which
//! fields a query may filter on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Metadata key holding the fragment text.
pub const DEFAULT_TEXT_FIELD: &str = "TEXT";

/// The use cases served by the retrieval core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    SqlExamples,
    Iot,
    Documents,
}

impl UseCase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SqlExamples => "sql_examples",
            Self::Iot => "iot",
            Self::Documents => "documents",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sql_examples" | "sql" => Ok(Self::SqlExamples),
            "iot" => Ok(Self::Iot),
            "documents" | "docs" => Ok(Self::Documents),
            other => Err(format!(
                "unknown use case '{other}', expected one of: sql_examples, iot, documents"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A filterable metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
}

impl FieldSchema {
    pub fn new(name: &str, field_type: FieldType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            description: description.to_string(),
        }
    }
}

/// Everything the retrieval pipeline needs to know about one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexProfile {
    pub use_case: UseCase,
    pub index_name: String,
    pub text_field: String,
    pub fields: Vec<FieldSchema>,
}

impl IndexProfile {
    /// Telemetry records from tracking devices.
    pub fn iot(index_name: impl Into<String>) -> Self {
        Self {
            use_case: UseCase::Iot,
            index_name: index_name.into(),
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            fields: vec![
                FieldSchema::new("device_id", FieldType::String, "unique device identifier"),
                FieldSchema::new("user_id", FieldType::String, "user associated with the device"),
                FieldSchema::new("battery_level", FieldType::Integer, "remaining battery percentage (0-100)"),
                FieldSchema::new("signal_strength", FieldType::Integer, "cellular signal strength (0-100)"),
                FieldSchema::new("status", FieldType::Integer, "device status (1 = active, 2 = inactive, 3 = error)"),
                FieldSchema::new("tamper_detected", FieldType::Boolean, "true if tampering was detected"),
                FieldSchema::new(
                    "restriction_violation",
                    FieldType::Boolean,
                    "true if the device is outside its allowed geofence",
                ),
                FieldSchema::new("latitude", FieldType::Float, "latitude coordinate"),
                FieldSchema::new("longitude", FieldType::Float, "longitude coordinate"),
            ],
        }
    }

    /// Uploaded document chunks. No filterable fields.
    pub fn documents(index_name: impl Into<String>) -> Self {
        Self {
            use_case: UseCase::Documents,
            index_name: index_name.into(),
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            fields: Vec::new(),
        }
    }

    /// Remembered natural-language question / SQL pairs.
    pub fn sql_examples(index_name: impl Into<String>) -> Self {
        Self {
            use_case: UseCase::SqlExamples,
            index_name: index_name.into(),
            text_field: DEFAULT_TEXT_FIELD.to_string(),
            fields: vec![
                FieldSchema::new("query", FieldType::String, "natural-language question"),
                FieldSchema::new("sql", FieldType::String, "SQL generated for the question"),
            ],
        }
    }

    pub fn has_filterable_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}
