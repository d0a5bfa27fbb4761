//! Vector index provider port.
//!
//! Mirrors the control plane (list/describe/create) and data plane
//! (upsert/query/delete) of a hosted vector database.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;
use crate::domain::models::{FilterPredicate, Metadata};

/// Parameters for creating a new index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: String,
    pub cloud: String,
    pub region: String,
}

/// What the provider reports about an existing index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub host: String,
    pub dimension: usize,
    pub ready: bool,
}

/// A connected index: its name and the data-plane host serving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexHandle {
    pub name: String,
    pub host: String,
}

/// A vector with its id and metadata, as stored by the provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub filter: Option<FilterPredicate>,
}

/// One ranked query match.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Metadata,
}

/// Trait for hosted vector indexes.
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Describe an index, `None` when it does not exist.
    async fn describe_index(&self, name: &str) -> DomainResult<Option<IndexDescription>>;

    /// Create an index. An index that already exists is reported as a
    /// `ProviderError::Conflict`.
    async fn create_index(&self, spec: &IndexSpec) -> DomainResult<()>;

    async fn upsert(&self, index: &IndexHandle, records: &[VectorRecord]) -> DomainResult<()>;

    /// Matches ordered by descending similarity.
    async fn query(&self, index: &IndexHandle, request: &QueryRequest) -> DomainResult<Vec<QueryMatch>>;

    async fn delete(&self, index: &IndexHandle, ids: &[String]) -> DomainResult<()>;
}
