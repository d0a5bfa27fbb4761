//! Re-ranking provider port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// A re-ranked document, pointing back into the submitted slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedDocument {
    /// Position of the document in the request
    pub index: usize,
    pub score: f32,
}

/// Trait for hosted cross-encoder re-rankers.
#[async_trait]
pub trait RerankProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Rank `documents` against `query`, returning at most `top_n` entries
    /// ordered by descending relevance.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> DomainResult<Vec<RankedDocument>>;
}
