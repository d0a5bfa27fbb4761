//! Pinecone hosted re-ranking (`POST /rerank`).

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::errors::{DomainResult, ProviderError};
use crate::domain::models::{PineconeConfig, RerankConfig};
use crate::domain::ports::{RankedDocument, RerankProvider};
use crate::infrastructure::http::{build_client, read_json, resolve_api_key, transport_error};

use super::client::pinecone_headers;

const SERVICE: &str = "pinecone-rerank";

pub struct PineconeReranker {
    client: Client,
    headers: HeaderMap,
    url: String,
    model: String,
}

impl PineconeReranker {
    pub fn new(pinecone: &PineconeConfig, rerank: &RerankConfig) -> DomainResult<Self> {
        let api_key = resolve_api_key(pinecone.api_key.as_ref(), "PINECONE_API_KEY", "Pinecone")?;
        Ok(Self {
            client: build_client(pinecone.timeout_secs)?,
            headers: pinecone_headers(&api_key, &pinecone.api_version)?,
            url: format!("{}/rerank", pinecone.control_plane_url.trim_end_matches('/')),
            model: rerank.model.clone(),
        })
    }
}

#[async_trait]
impl RerankProvider for PineconeReranker {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    #[instrument(skip(self, query, documents), fields(count = documents.len(), top_n))]
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> DomainResult<Vec<RankedDocument>> {
        if documents.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let body = RerankRequest {
            model: &self.model,
            query,
            documents: documents.iter().map(|text| RerankInput { text }).collect(),
            top_n: top_n.min(documents.len()),
            return_documents: false,
        };

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let result: RerankResponse = read_json(SERVICE, response).await?;

        let mut ranked = Vec::with_capacity(result.data.len());
        for item in result.data {
            if item.index >= documents.len() {
                return Err(ProviderError::Malformed {
                    service: SERVICE,
                    message: format!(
                        "result index {} out of range for {} documents",
                        item.index,
                        documents.len()
                    ),
                }
                .into());
            }
            ranked.push(RankedDocument {
                index: item.index,
                score: item.score,
            });
        }
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);
        Ok(ranked)
    }
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<RerankInput<'a>>,
    top_n: usize,
    return_documents: bool,
}

#[derive(Debug, Serialize)]
struct RerankInput<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    #[serde(default)]
    data: Vec<RerankResult>,
}

#[derive(Debug, Deserialize)]
struct RerankResult {
    index: usize,
    score: f32,
}
