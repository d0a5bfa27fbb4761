//! Embedding client.
//!
//! Validates and normalizes input, batches it to the provider's limit,
//! retries transient failures and applies the configured failure policy.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::domain::errors::{DomainError, DomainResult, ProviderError};
use crate::domain::models::{EmbeddingConfig, EmbeddingFailurePolicy};
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::http::RetryPolicy;

pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    retry: RetryPolicy,
    dimension: usize,
    on_failure: EmbeddingFailurePolicy,
}

impl EmbeddingClient {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        config: &EmbeddingConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            retry,
            dimension: config.dimension,
            on_failure: config.on_failure,
        }
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// A vector of zeros with the configured dimension.
    pub fn zero_vector(&self) -> Vec<f32> {
        vec![0.0; self.dimension]
    }

    /// Embed a single text.
    pub async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| {
            DomainError::Provider(ProviderError::Malformed {
                service: self.provider.name(),
                message: "no embedding returned".to_string(),
            })
        })
    }

    /// Embed several texts, preserving order and count.
    pub async fn embed_many(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        self.embed_with_policy(texts, self.on_failure).await
    }

    /// Like [`Self::embed_many`] but always surfaces provider failures, for
    /// indexing paths where a zero vector would be stored permanently.
    pub async fn embed_many_strict(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        self.embed_with_policy(texts, EmbeddingFailurePolicy::Raise).await
    }

    #[instrument(skip(self, texts), fields(count = texts.len(), provider = self.provider.name()))]
    async fn embed_with_policy(
        &self,
        texts: &[String],
        on_failure: EmbeddingFailurePolicy,
    ) -> DomainResult<Vec<Vec<f32>>> {
        let inputs = normalize_inputs(texts)?;

        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.provider.max_batch_size().max(1)) {
            match self.embed_batch(batch).await {
                Ok(batch_vectors) => vectors.extend(batch_vectors),
                Err(err) => match (on_failure, &err) {
                    // Bad output shape or input is not a provider outage.
                    (EmbeddingFailurePolicy::ZeroVector, DomainError::Provider(_)) => {
                        warn!(error = %err, count = batch.len(), "embedding failed, substituting zero vectors");
                        vectors.extend(std::iter::repeat_with(|| self.zero_vector()).take(batch.len()));
                    }
                    _ => return Err(err),
                },
            }
        }

        Ok(vectors)
    }

    async fn embed_batch(&self, batch: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        let vectors = self
            .retry
            .execute("embed_batch", || self.provider.embed_batch(batch))
            .await?;

        if vectors.len() != batch.len() {
            return Err(ProviderError::Malformed {
                service: self.provider.name(),
                message: format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
            }
            .into());
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(DomainError::Validation(format!(
                "embedding dimension {} does not match configured dimension {}",
                bad.len(),
                self.dimension
            )));
        }

        Ok(vectors)
    }
}

/// Collapse newlines to spaces and trim; reject empty input and blank entries.
fn normalize_inputs(texts: &[String]) -> DomainResult<Vec<String>> {
    if texts.is_empty() {
        return Err(DomainError::Validation(
            "no texts provided for embedding".to_string(),
        ));
    }

    texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let normalized = text.replace(['\r', '\n'], " ").trim().to_string();
            if normalized.is_empty() {
                Err(DomainError::Validation(format!(
                    "text at position {i} is empty"
                )))
            } else {
                Ok(normalized)
            }
        })
        .collect()
}
