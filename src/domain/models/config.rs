use serde::{Deserialize, Serialize};
use std::fmt;

use super::profile::{IndexProfile, UseCase};

/// Main configuration structure for vectorcase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// OpenAI-compatible embedding and chat API
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Pinecone vector store and inference API
    #[serde(default)]
    pub pinecone: PineconeConfig,

    /// Embedding client behavior
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Index names per use case
    #[serde(default)]
    pub indexes: IndexesConfig,

    /// Vector store adapter behavior
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Query interpreter (natural language to filter)
    #[serde(default)]
    pub interpreter: InterpreterConfig,

    /// Retrieval orchestrator
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Batched re-ranking
    #[serde(default)]
    pub rerank: RerankConfig,

    /// Document chunking
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Retry backoff shared by provider calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Answer, summary and SQL generation
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Build the index profile for a use case from the configured index names.
    pub fn profile(&self, use_case: UseCase) -> IndexProfile {
        match use_case {
            UseCase::SqlExamples => IndexProfile::sql_examples(&self.indexes.sql_examples),
            UseCase::Iot => IndexProfile::iot(&self.indexes.iot_telemetry),
            UseCase::Documents => IndexProfile::documents(&self.indexes.documents),
        }
    }
}

/// Write an optional secret without revealing it.
fn redact(key: Option<&String>) -> &'static str {
    if key.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

/// OpenAI-compatible API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OpenAiConfig {
    /// API key. Falls back to `OPENAI_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum texts per embeddings request
    #[serde(default = "default_embedding_batch_size")]
    pub max_batch_size: usize,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_embedding_batch_size() -> usize {
    2048
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
            max_batch_size: default_embedding_batch_size(),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redact(self.api_key.as_ref()))
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}

/// Pinecone configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PineconeConfig {
    /// API key. Falls back to `PINECONE_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Control plane and inference base URL
    #[serde(default = "default_pinecone_url")]
    pub control_plane_url: String,

    /// Value of the `X-Pinecone-API-Version` header
    #[serde(default = "default_pinecone_api_version")]
    pub api_version: String,

    /// Cloud for serverless index placement
    #[serde(default = "default_cloud")]
    pub cloud: String,

    /// Region for serverless index placement
    #[serde(default = "default_region")]
    pub region: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_pinecone_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_pinecone_api_version() -> String {
    "2024-07".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            control_plane_url: default_pinecone_url(),
            api_version: default_pinecone_api_version(),
            cloud: default_cloud(),
            region: default_region(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &redact(self.api_key.as_ref()))
            .field("control_plane_url", &self.control_plane_url)
            .field("api_version", &self.api_version)
            .field("cloud", &self.cloud)
            .field("region", &self.region)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// What the embedding client does once retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingFailurePolicy {
    /// Surface a provider error
    #[default]
    Raise,
    /// Return one zero vector of the configured dimension per input
    ZeroVector,
}

/// Embedding client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Vector dimension enforced for every index and embedding
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Retries after the first failed attempt
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,

    /// Behavior once retries are exhausted
    #[serde(default)]
    pub on_failure: EmbeddingFailurePolicy,
}

const fn default_dimension() -> usize {
    1536
}

const fn default_embedding_retries() -> u32 {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            max_retries: default_embedding_retries(),
            on_failure: EmbeddingFailurePolicy::default(),
        }
    }
}

/// Index name per use case
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexesConfig {
    #[serde(default = "default_sql_index")]
    pub sql_examples: String,

    #[serde(default = "default_iot_index")]
    pub iot_telemetry: String,

    #[serde(default = "default_documents_index")]
    pub documents: String,
}

fn default_sql_index() -> String {
    "sql-examples".to_string()
}

fn default_iot_index() -> String {
    "iot-telemetry".to_string()
}

fn default_documents_index() -> String {
    "documents".to_string()
}

impl Default for IndexesConfig {
    fn default() -> Self {
        Self {
            sql_examples: default_sql_index(),
            iot_telemetry: default_iot_index(),
            documents: default_documents_index(),
        }
    }
}

/// Vector store adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VectorStoreConfig {
    /// Records per upsert request
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    /// How long to wait for a new index to report ready
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Interval between readiness checks
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,

    /// Similarity metric for new indexes
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Retries for transient failures of a single provider call
    #[serde(default = "default_store_retries")]
    pub max_retries: u32,
}

const fn default_upsert_batch_size() -> usize {
    100
}

const fn default_ready_timeout_secs() -> u64 {
    60
}

const fn default_ready_poll_interval_ms() -> u64 {
    1000
}

fn default_metric() -> String {
    "cosine".to_string()
}

const fn default_store_retries() -> u32 {
    3
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            upsert_batch_size: default_upsert_batch_size(),
            ready_timeout_secs: default_ready_timeout_secs(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            metric: default_metric(),
            max_retries: default_store_retries(),
        }
    }
}

/// Query interpreter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InterpreterConfig {
    #[serde(default = "default_interpreter_model")]
    pub model: String,

    #[serde(default = "default_interpreter_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_interpreter_retries")]
    pub max_retries: u32,
}

fn default_interpreter_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_interpreter_max_tokens() -> u32 {
    200
}

const fn default_interpreter_retries() -> u32 {
    2
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            model: default_interpreter_model(),
            max_tokens: default_interpreter_max_tokens(),
            max_retries: default_interpreter_retries(),
        }
    }
}

/// Retrieval orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Candidates fetched by similarity search and by the filter scan
    #[serde(default = "default_retrieval_top_k")]
    pub top_k: usize,

    /// Fragments kept after re-ranking
    #[serde(default = "default_final_count")]
    pub final_count: usize,
}

const fn default_retrieval_top_k() -> usize {
    2000
}

const fn default_final_count() -> usize {
    200
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_retrieval_top_k(),
            final_count: default_final_count(),
        }
    }
}

/// Batched re-ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RerankConfig {
    #[serde(default = "default_rerank_model")]
    pub model: String,

    /// Documents per provider call
    #[serde(default = "default_batch_limit")]
    pub batch_limit: usize,

    /// Documents kept from each batch in a reduction round
    #[serde(default = "default_partial_top_k")]
    pub partial_top_k: usize,

    /// Reduction rounds allowed before giving up
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

fn default_rerank_model() -> String {
    "bge-reranker-v2-m3".to_string()
}

const fn default_batch_limit() -> usize {
    100
}

const fn default_partial_top_k() -> usize {
    30
}

const fn default_max_rounds() -> usize {
    16
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            model: default_rerank_model(),
            batch_limit: default_batch_limit(),
            partial_top_k: default_partial_top_k(),
            max_rounds: default_max_rounds(),
        }
    }
}

/// Chunking configuration (sizes in characters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

const fn default_chunk_size() -> usize {
    800
}

const fn default_chunk_overlap() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Delay before the first retry; doubles per attempt
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for a single delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Answer, summary and SQL generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    #[serde(default = "default_answer_model")]
    pub model: String,

    #[serde(default = "default_sql_model")]
    pub sql_model: String,

    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: u32,

    /// Contexts passed to the answer prompt
    #[serde(default = "default_max_contexts")]
    pub max_contexts: usize,

    #[serde(default = "default_generation_retries")]
    pub max_retries: u32,

    /// Fully qualified table the SQL generator targets
    #[serde(default = "default_sql_table")]
    pub sql_table: String,
}

fn default_answer_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_sql_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_generation_max_tokens() -> u32 {
    500
}

const fn default_max_contexts() -> usize {
    5
}

const fn default_generation_retries() -> u32 {
    2
}

fn default_sql_table() -> String {
    "tracking_dataset.tracking_data".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_answer_model(),
            sql_model: default_sql_model(),
            max_tokens: default_generation_max_tokens(),
            max_contexts: default_max_contexts(),
            max_retries: default_generation_retries(),
            sql_table: default_sql_table(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
