//! Structured filter predicates
//!
//! A [`FilterPredicate`] maps field names to a single comparison against a
//! scalar operand. Predicates are built per query (usually by the query
//! interpreter) and evaluated client-side against fragment metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fragment::{Metadata, MetadataValue};
use crate::domain::errors::{DomainError, DomainResult};

/// Comparison operator of a filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")]
    Eq,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$lte")]
    Lte,
    #[serde(rename = "$gte")]
    Gte,
}

impl FilterOp {
    /// Parse the wire form (`$eq`, `$lt`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "$eq" => Some(Self::Eq),
            "$lt" => Some(Self::Lt),
            "$gt" => Some(Self::Gt),
            "$lte" => Some(Self::Lte),
            "$gte" => Some(Self::Gte),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Lt => "$lt",
            Self::Gt => "$gt",
            Self::Lte => "$lte",
            Self::Gte => "$gte",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operator applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub op: FilterOp,
    pub operand: MetadataValue,
}

impl Condition {
    /// Evaluate against a stored value. A missing value never passes.
    pub fn evaluate(&self, stored: Option<&MetadataValue>) -> bool {
        let Some(stored) = stored else {
            return false;
        };

        match self.op {
            FilterOp::Eq => eq_matches(stored, &self.operand),
            FilterOp::Lt => compare(stored, &self.operand, |a, b| a < b),
            FilterOp::Gt => compare(stored, &self.operand, |a, b| a > b),
            FilterOp::Lte => compare(stored, &self.operand, |a, b| a <= b),
            FilterOp::Gte => compare(stored, &self.operand, |a, b| a >= b),
        }
    }
}

/// Boolean operands compare case-insensitively against the stored value's
/// text, numeric operands compare numerically, strings compare exactly.
fn eq_matches(stored: &MetadataValue, operand: &MetadataValue) -> bool {
    match operand {
        MetadataValue::Bool(expected) => stored.to_string().to_lowercase() == expected.to_string(),
        MetadataValue::Number(expected) => stored.as_number() == Some(*expected),
        MetadataValue::String(expected) => stored.to_string() == *expected,
    }
}

/// Range operators treat booleans as 1 and 0; `eq` does not.
fn range_number(value: &MetadataValue) -> Option<f64> {
    match value {
        MetadataValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_number(),
    }
}

fn compare(stored: &MetadataValue, operand: &MetadataValue, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (range_number(stored), range_number(operand)) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// Field name to a single condition, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPredicate {
    conditions: Vec<(String, Condition)>,
}

impl FilterPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition. A later condition on the same field replaces the
    /// earlier one.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, op: FilterOp, operand: impl Into<MetadataValue>) -> Self {
        self.insert(field.into(), Condition { op, operand: operand.into() });
        self
    }

    pub fn insert(&mut self, field: String, condition: Condition) {
        if let Some(slot) = self.conditions.iter_mut().find(|(f, _)| *f == field) {
            slot.1 = condition;
        } else {
            self.conditions.push((field, condition));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(f, c)| (f.as_str(), c))
    }

    /// True when every condition passes against `metadata`.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.evaluate(metadata.get(field)))
    }

    /// Parse the `{field: {"$op": value}}` shape produced by the interpreter.
    ///
    /// Unknown operators and non-scalar operands are skipped. A bare scalar
    /// (`{"device_id": "abc"}`) is read as `$eq`. When one field carries
    /// several operators the last one in document order wins.
    pub fn from_json(value: &serde_json::Value) -> DomainResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            DomainError::Parse(format!("filter must be a JSON object, got: {value}"))
        })?;

        let mut predicate = Self::new();
        for (field, spec) in object {
            match spec {
                serde_json::Value::Object(ops) => {
                    for (op, operand) in ops {
                        let Some(op) = FilterOp::parse(op) else {
                            tracing::debug!(field = %field, op = %op, "ignoring unsupported filter operator");
                            continue;
                        };
                        let Some(operand) = MetadataValue::from_json(operand) else {
                            tracing::debug!(field = %field, "ignoring non-scalar filter operand");
                            continue;
                        };
                        predicate.insert(field.clone(), Condition { op, operand });
                    }
                }
                scalar => {
                    if let Some(operand) = MetadataValue::from_json(scalar) {
                        predicate.insert(field.clone(), Condition { op: FilterOp::Eq, operand });
                    }
                }
            }
        }

        Ok(predicate)
    }

    /// Provider-side filter document (`{"field": {"$op": value}}`).
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .conditions
            .iter()
            .map(|(field, c)| {
                let mut op = serde_json::Map::new();
                op.insert(c.op.as_str().to_string(), c.operand.to_json());
                (field.clone(), serde_json::Value::Object(op))
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(object)
    }
}

/// Free-function form of [`FilterPredicate::matches`].
pub fn passes_filter(metadata: &Metadata, predicate: &FilterPredicate) -> bool {
    predicate.matches(metadata)
}
