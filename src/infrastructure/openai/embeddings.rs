//! OpenAI embedding provider adapter.
//!
//! Calls the `/embeddings` endpoint of OpenAI or any OpenAI-compatible
//! server (Azure OpenAI, local gateways).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainResult, ProviderError};
use crate::domain::models::OpenAiConfig;
use crate::domain::ports::EmbeddingProvider;
use crate::infrastructure::http::{build_client, read_json, resolve_api_key, transport_error};

const SERVICE: &str = "openai-embeddings";

/// OpenAI embedding provider.
pub struct OpenAiEmbeddingProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_batch_size: usize,
}

impl OpenAiEmbeddingProvider {
    /// Build the provider. Fails with a configuration error when no API key
    /// is configured or exported.
    pub fn new(config: &OpenAiConfig) -> DomainResult<Self> {
        let api_key = resolve_api_key(config.api_key.as_ref(), "OPENAI_API_KEY", "OpenAI")?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            max_batch_size: config.max_batch_size.max(1),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn embed_batch(&self, texts: &[String]) -> DomainResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url);
        let request_body = EmbeddingsRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let result: EmbeddingsResponse = read_json(SERVICE, response).await?;

        if result.data.len() != texts.len() {
            return Err(ProviderError::Malformed {
                service: SERVICE,
                message: format!("expected {} embeddings, got {}", texts.len(), result.data.len()),
            }
            .into());
        }

        // Sort by index to maintain input order
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
