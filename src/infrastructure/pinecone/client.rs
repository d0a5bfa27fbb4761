//! Pinecone REST adapter for the `VectorIndexProvider` port.
//!
//! Control-plane calls (describe/create) go to the configured API base;
//! data-plane calls go to the per-index host returned by describe.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{metadata_from_json, Metadata, PineconeConfig};
use crate::domain::ports::{
    IndexDescription, IndexHandle, IndexSpec, QueryMatch, QueryRequest, VectorIndexProvider,
    VectorRecord,
};
use crate::infrastructure::http::{
    build_client, expect_success, read_json, resolve_api_key, transport_error,
};

const SERVICE: &str = "pinecone";

/// Build the headers every Pinecone request carries.
pub(crate) fn pinecone_headers(api_key: &str, api_version: &str) -> DomainResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Api-Key",
        HeaderValue::from_str(api_key)
            .map_err(|_| DomainError::Configuration("Pinecone API key is not a valid header value".to_string()))?,
    );
    headers.insert(
        "X-Pinecone-API-Version",
        HeaderValue::from_str(api_version).map_err(|_| {
            DomainError::Configuration(format!("invalid Pinecone API version '{api_version}'"))
        })?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Pinecone index client.
pub struct PineconeClient {
    client: Client,
    headers: HeaderMap,
    control_plane_url: String,
}

impl PineconeClient {
    pub fn new(config: &PineconeConfig) -> DomainResult<Self> {
        let api_key = resolve_api_key(config.api_key.as_ref(), "PINECONE_API_KEY", "Pinecone")?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            headers: pinecone_headers(&api_key, &config.api_version)?,
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
        })
    }

    /// Data-plane base URL for an index. Hosts come back from the control
    /// plane without a scheme.
    fn data_plane_url(index: &IndexHandle, path: &str) -> String {
        let host = index.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}{path}")
        } else {
            format!("https://{host}{path}")
        }
    }
}

#[async_trait]
impl VectorIndexProvider for PineconeClient {
    fn name(&self) -> &'static str {
        SERVICE
    }

    #[instrument(skip(self))]
    async fn describe_index(&self, name: &str) -> DomainResult<Option<IndexDescription>> {
        let url = format!("{}/indexes/{name}", self.control_plane_url);
        let response = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(index = name, "index does not exist");
            return Ok(None);
        }

        let model: IndexModel = read_json(SERVICE, response).await?;
        Ok(Some(IndexDescription {
            name: model.name,
            host: model.host,
            dimension: model.dimension,
            ready: model.status.is_some_and(|s| s.ready),
        }))
    }

    #[instrument(skip(self), fields(index = %spec.name))]
    async fn create_index(&self, spec: &IndexSpec) -> DomainResult<()> {
        let url = format!("{}/indexes", self.control_plane_url);
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: ServerlessSpec {
                serverless: ServerlessPlacement {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        expect_success(SERVICE, response).await
    }

    #[instrument(skip(self, records), fields(index = %index.name, count = records.len()))]
    async fn upsert(&self, index: &IndexHandle, records: &[VectorRecord]) -> DomainResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let url = Self::data_plane_url(index, "/vectors/upsert");
        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&UpsertRequest { vectors: records })
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let _: UpsertResponse = read_json(SERVICE, response).await?;
        Ok(())
    }

    #[instrument(skip(self, request), fields(index = %index.name, top_k = request.top_k))]
    async fn query(&self, index: &IndexHandle, request: &QueryRequest) -> DomainResult<Vec<QueryMatch>> {
        let url = Self::data_plane_url(index, "/query");
        let body = QueryBody {
            vector: &request.vector,
            top_k: request.top_k,
            include_metadata: true,
            include_values: false,
            filter: request.filter.as_ref().map(|f| f.to_json()),
        };

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let result: QueryResponse = read_json(SERVICE, response).await?;
        Ok(result
            .matches
            .into_iter()
            .map(|m| QueryMatch {
                id: m.id,
                score: m.score,
                metadata: m
                    .metadata
                    .as_ref()
                    .map(metadata_from_json)
                    .unwrap_or_else(Metadata::new),
            })
            .collect())
    }

    #[instrument(skip(self, ids), fields(index = %index.name, count = ids.len()))]
    async fn delete(&self, index: &IndexHandle, ids: &[String]) -> DomainResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let url = Self::data_plane_url(index, "/vectors/delete");
        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(&DeleteRequest { ids })
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        expect_success(SERVICE, response).await
    }
}

// -- Pinecone API request/response types --

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    host: String,
    dimension: usize,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    serverless: ServerlessPlacement<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessPlacement<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    #[allow(dead_code)]
    upserted_count: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<MatchBody>,
}

#[derive(Debug, Deserialize)]
struct MatchBody {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
}
