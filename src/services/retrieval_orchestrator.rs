//! Retrieval orchestrator.
//!
//! ```text
//! START -> INTERPRET_FILTER -> FILTER_APPLIED ----------> RERANK -> DONE
//!                  |                 | (no matches)         ^
//!                  +-----------------+-> EMBEDDING_FALLBACK-+
//! ```
//!
//! One orchestrator serves every index; the [`IndexProfile`] supplies the
//! index name, the text field and the filterable schema. Profiles without
//! filterable fields go straight to embedding search.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FilterPredicate, IndexProfile, RetrievalConfig};
use crate::domain::ports::IndexHandle;

use super::embedding_client::EmbeddingClient;
use super::query_interpreter::QueryInterpreter;
use super::reranker::BatchReranker;
use super::vector_store::VectorStoreAdapter;

/// Texts in descending relevance plus the path that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalOutcome {
    pub fragments: Vec<String>,
    /// The interpreted filter matched at least one fragment
    pub used_filter: bool,
    /// Embedding search ran after interpretation produced nothing usable
    pub used_fallback: bool,
}

pub struct RetrievalOrchestrator {
    interpreter: Arc<QueryInterpreter>,
    embeddings: Arc<EmbeddingClient>,
    store: Arc<VectorStoreAdapter>,
    reranker: Arc<BatchReranker>,
    top_k: usize,
    final_count: usize,
}

impl RetrievalOrchestrator {
    pub fn new(
        interpreter: Arc<QueryInterpreter>,
        embeddings: Arc<EmbeddingClient>,
        store: Arc<VectorStoreAdapter>,
        reranker: Arc<BatchReranker>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            interpreter,
            embeddings,
            store,
            reranker,
            top_k: config.top_k,
            final_count: config.final_count,
        }
    }

    /// Retrieve the fragments most relevant to `query`.
    ///
    /// Only an empty query and configuration problems are errors; provider
    /// failures degrade to fewer (possibly zero) results.
    #[instrument(skip(self, profile), fields(index = %profile.index_name))]
    pub async fn retrieve(
        &self,
        query: &str,
        profile: &IndexProfile,
        final_count: Option<usize>,
    ) -> DomainResult<RetrievalOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::Validation("query cannot be empty".to_string()));
        }
        let final_count = final_count.unwrap_or(self.final_count);

        let handle = match self.store.ensure_index(&profile.index_name).await {
            Ok(handle) => handle,
            Err(err) => {
                degrade(err, "index unavailable")?;
                return Ok(RetrievalOutcome::default());
            }
        };

        let used_fallback = if profile.has_filterable_fields() {
            let predicate = self.interpreter.infer_filter(query, profile).await;
            if predicate.is_empty() {
                debug!("no filter inferred, falling back to embedding search");
            } else {
                let candidates = self.filter_scan(&handle, profile, &predicate).await?;
                if !candidates.is_empty() {
                    let fragments = self.rerank(query, candidates, final_count).await;
                    info!(returned = fragments.len(), "filter retrieval complete");
                    return Ok(RetrievalOutcome {
                        fragments,
                        used_filter: true,
                        used_fallback: false,
                    });
                }
                debug!(conditions = predicate.len(), "filter matched nothing, falling back to embedding search");
            }
            true
        } else {
            false
        };

        let candidates = self.embedding_search(&handle, profile, query).await?;
        let fragments = self.rerank(query, candidates, final_count).await;
        info!(returned = fragments.len(), used_fallback, "embedding retrieval complete");

        Ok(RetrievalOutcome {
            fragments,
            used_filter: false,
            used_fallback,
        })
    }

    /// Full scan with a neutral vector, predicate evaluated client-side.
    async fn filter_scan(
        &self,
        handle: &IndexHandle,
        profile: &IndexProfile,
        predicate: &FilterPredicate,
    ) -> DomainResult<Vec<String>> {
        let scanned = match self
            .store
            .query(handle, &profile.text_field, self.store.neutral_vector(), self.top_k, None)
            .await
        {
            Ok(scanned) => scanned,
            Err(err) => {
                degrade(err, "filter scan failed")?;
                return Ok(Vec::new());
            }
        };

        let total = scanned.len();
        let matched: Vec<String> = scanned
            .into_iter()
            .filter(|s| predicate.matches(&s.fragment.metadata))
            .map(|s| s.fragment.text)
            .collect();
        debug!(scanned = total, matched = matched.len(), "filter scan complete");
        Ok(matched)
    }

    async fn embedding_search(
        &self,
        handle: &IndexHandle,
        profile: &IndexProfile,
        query: &str,
    ) -> DomainResult<Vec<String>> {
        let vector = match self.embeddings.embed(query).await {
            Ok(vector) => vector,
            Err(err) => {
                degrade(err, "query embedding failed")?;
                return Ok(Vec::new());
            }
        };

        match self
            .store
            .query(handle, &profile.text_field, vector, self.top_k, None)
            .await
        {
            Ok(matches) => Ok(matches.into_iter().map(|s| s.fragment.text).collect()),
            Err(err) => {
                degrade(err, "similarity query failed")?;
                Ok(Vec::new())
            }
        }
    }

    async fn rerank(&self, query: &str, candidates: Vec<String>, final_count: usize) -> Vec<String> {
        let fallback: Vec<String> = candidates.iter().take(final_count).cloned().collect();
        match self.reranker.rerank(query, candidates, final_count).await {
            Ok(ranked) => ranked,
            Err(err) => {
                warn!(error = %err, "re-ranking aborted, returning candidates unranked");
                fallback
            }
        }
    }
}

/// Swallow provider and parse failures with a warning; surface the rest.
fn degrade(err: DomainError, context: &str) -> DomainResult<()> {
    match err {
        DomainError::Provider(_) | DomainError::Parse(_) => {
            warn!(error = %err, "{context}, degrading");
            Ok(())
        }
        DomainError::Validation(_) | DomainError::Configuration(_) => Err(err),
    }
}
