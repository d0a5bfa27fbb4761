//! Batched re-ranking.
//!
//! Candidate sets larger than the provider's batch limit are reduced in
//! rounds: each batch keeps its partial top-K, the survivors are
//! concatenated, and the loop repeats until one batch remains for the final
//! re-rank.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult, ProviderError};
use crate::domain::models::RerankConfig;
use crate::domain::ports::RerankProvider;

pub struct BatchReranker {
    provider: Arc<dyn RerankProvider>,
    batch_limit: usize,
    partial_top_k: usize,
    max_rounds: usize,
}

impl BatchReranker {
    /// Fails unless `0 < partial_top_k < batch_limit`, which guarantees that
    /// every reduction round shrinks the working set.
    pub fn new(provider: Arc<dyn RerankProvider>, config: &RerankConfig) -> DomainResult<Self> {
        if config.partial_top_k == 0 || config.partial_top_k >= config.batch_limit {
            return Err(DomainError::Configuration(format!(
                "rerank partial_top_k ({}) must be between 1 and batch_limit ({}) exclusive",
                config.partial_top_k, config.batch_limit
            )));
        }
        Ok(Self {
            provider,
            batch_limit: config.batch_limit,
            partial_top_k: config.partial_top_k,
            max_rounds: config.max_rounds,
        })
    }

    /// Re-rank `documents` against `query`, returning at most `top_n` texts in
    /// descending relevance.
    ///
    /// Provider failures fall back to input order and are never returned.
    /// The only error is [`ProviderError::RerankDiverged`].
    #[instrument(skip(self, query, documents), fields(count = documents.len(), top_n))]
    pub async fn rerank(
        &self,
        query: &str,
        documents: Vec<String>,
        top_n: usize,
    ) -> DomainResult<Vec<String>> {
        if documents.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let partial_k = self.partial_top_k.min(top_n);
        let mut working = documents;
        let mut rounds = 0;

        while working.len() > self.batch_limit {
            if rounds >= self.max_rounds {
                return Err(ProviderError::RerankDiverged {
                    rounds,
                    remaining: working.len(),
                }
                .into());
            }

            let mut survivors = Vec::with_capacity(working.len().div_ceil(self.batch_limit) * partial_k);
            for batch in working.chunks(self.batch_limit) {
                survivors.extend(self.rerank_once(query, batch, partial_k).await);
            }
            debug!(round = rounds, before = working.len(), after = survivors.len(), "reduction round");

            working = survivors;
            rounds += 1;
        }

        let ranked = self.rerank_once(query, &working, top_n).await;
        info!(rounds, returned = ranked.len(), "re-ranking complete");
        Ok(ranked)
    }

    /// One provider call over a single batch, falling back to the first
    /// `top_n` inputs on failure.
    async fn rerank_once(&self, query: &str, batch: &[String], top_n: usize) -> Vec<String> {
        let top_n = top_n.min(batch.len());
        if top_n == 0 {
            return Vec::new();
        }

        match self.provider.rerank(query, batch, top_n).await {
            Ok(ranked) if !ranked.is_empty() => ranked
                .into_iter()
                .filter_map(|r| batch.get(r.index).cloned())
                .take(top_n)
                .collect(),
            Ok(_) => {
                warn!(provider = self.provider.name(), "re-ranker returned no results, keeping input order");
                batch[..top_n].to_vec()
            }
            Err(err) => {
                warn!(provider = self.provider.name(), error = %err, "re-ranking failed, keeping input order");
                batch[..top_n].to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::WordOverlapReranker;
    use std::sync::atomic::Ordering;

    fn reranker(provider: Arc<WordOverlapReranker>) -> BatchReranker {
        BatchReranker::new(provider, &RerankConfig::default()).unwrap()
    }

    fn docs(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("doc {i}")).collect()
    }

    #[test]
    fn test_rejects_non_shrinking_configuration() {
        let provider = Arc::new(WordOverlapReranker::new());
        let config = RerankConfig {
            batch_limit: 10,
            partial_top_k: 10,
            ..Default::default()
        };
        assert!(matches!(
            BatchReranker::new(provider, &config),
            Err(DomainError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let provider = Arc::new(WordOverlapReranker::new());
        let result = reranker(provider.clone()).rerank("q", Vec::new(), 10).await.unwrap();
        assert!(result.is_empty());
        assert!(provider.batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_single_batch_is_bounded_and_ordered() {
        let provider = Arc::new(WordOverlapReranker::new());
        let documents = vec![
            "nothing relevant".to_string(),
            "battery low alert".to_string(),
            "battery fine".to_string(),
        ];

        let result = reranker(provider.clone())
            .rerank("low battery", documents, 2)
            .await
            .unwrap();

        assert_eq!(result, vec!["battery low alert", "battery fine"]);
        assert_eq!(provider.batch_sizes(), vec![3]);
    }

    #[tokio::test]
    async fn test_top_n_larger_than_input() {
        let provider = Arc::new(WordOverlapReranker::new());
        let result = reranker(provider).rerank("doc", docs(7), 200).await.unwrap();
        assert_eq!(result.len(), 7);
    }

    #[tokio::test]
    async fn test_350_items_converge() {
        let provider = Arc::new(WordOverlapReranker::new());
        let result = reranker(provider.clone()).rerank("doc", docs(350), 200).await.unwrap();

        assert!(result.len() <= 200);
        // 350 -> 4 batches -> 120 -> 2 batches -> 50 -> final
        assert_eq!(provider.batch_sizes(), vec![100, 100, 100, 50, 100, 20, 50]);
        assert_eq!(result.len(), 50);
    }

    #[tokio::test]
    async fn test_small_top_n_limits_partial_k() {
        let provider = Arc::new(WordOverlapReranker::new());
        let result = reranker(provider.clone()).rerank("doc", docs(250), 5).await.unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(provider.batch_sizes(), vec![100, 100, 50, 15]);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_input_order() {
        let provider = Arc::new(WordOverlapReranker::new());
        provider.fail.store(true, Ordering::SeqCst);

        let result = reranker(provider).rerank("doc", docs(10), 3).await.unwrap();
        assert_eq!(result, vec!["doc 0", "doc 1", "doc 2"]);
    }

    #[tokio::test]
    async fn test_round_cap_is_provider_error() {
        let provider = Arc::new(WordOverlapReranker::new());
        let config = RerankConfig {
            batch_limit: 10,
            partial_top_k: 9,
            max_rounds: 1,
            ..Default::default()
        };
        let reranker = BatchReranker::new(provider, &config).unwrap();

        let err = reranker.rerank("doc", docs(100), 50).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::Provider(ProviderError::RerankDiverged { rounds: 1, .. })
        ));
    }
}
