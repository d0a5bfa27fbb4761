//! Service wiring for CLI commands.
//!
//! Providers are built once and shared by `Arc`; each command asks the
//! context for the service it needs.

use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, IndexProfile, UseCase};
use crate::domain::ports::{ChatProvider, EmbeddingProvider, RerankProvider, VectorIndexProvider};
use crate::infrastructure::http::RetryPolicy;
use crate::infrastructure::openai::{OpenAiChatProvider, OpenAiEmbeddingProvider};
use crate::infrastructure::pinecone::{PineconeClient, PineconeReranker};
use crate::services::{
    AnswerGenerator, BatchReranker, DocumentIndexer, EmbeddingClient, QueryInterpreter,
    RecordIngester, RetrievalOrchestrator, SqlGenerator, Summarizer, TextChunker,
    VectorStoreAdapter,
};

pub struct AppContext {
    config: Config,
    chat: Arc<dyn ChatProvider>,
    embeddings: Arc<EmbeddingClient>,
    store: Arc<VectorStoreAdapter>,
    interpreter: Arc<QueryInterpreter>,
    reranker: Arc<BatchReranker>,
}

impl AppContext {
    /// Build the OpenAI and Pinecone providers. Missing API keys fail here,
    /// before any request is sent.
    pub fn from_config(config: Config) -> DomainResult<Self> {
        let embedder = Arc::new(OpenAiEmbeddingProvider::new(&config.openai)?);
        let chat = Arc::new(OpenAiChatProvider::new(&config.openai)?);
        let index = Arc::new(PineconeClient::new(&config.pinecone)?);
        let rerank = Arc::new(PineconeReranker::new(&config.pinecone, &config.rerank)?);
        Self::with_providers(config, embedder, chat, index, rerank)
    }

    /// Wire services around arbitrary port implementations.
    pub fn with_providers(
        config: Config,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        index: Arc<dyn VectorIndexProvider>,
        rerank: Arc<dyn RerankProvider>,
    ) -> DomainResult<Self> {
        let embeddings = Arc::new(EmbeddingClient::new(
            embedder,
            &config.embedding,
            RetryPolicy::from_config(config.embedding.max_retries, &config.retry),
        ));
        let store = Arc::new(VectorStoreAdapter::new(index, &config));
        let interpreter = Arc::new(QueryInterpreter::new(
            chat.clone(),
            &config.interpreter,
            &config.retry,
        ));
        let reranker = Arc::new(BatchReranker::new(rerank, &config.rerank)?);

        Ok(Self {
            config,
            chat,
            embeddings,
            store,
            interpreter,
            reranker,
        })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &VectorStoreAdapter {
        &self.store
    }

    /// The built-in profile for `use_case`, bound to its configured index.
    pub fn profile(&self, use_case: UseCase) -> IndexProfile {
        let indexes = &self.config.indexes;
        match use_case {
            UseCase::SqlExamples => IndexProfile::sql_examples(&indexes.sql_examples),
            UseCase::Iot => IndexProfile::iot(&indexes.iot_telemetry),
            UseCase::Documents => IndexProfile::documents(&indexes.documents),
        }
    }

    pub fn orchestrator(&self) -> RetrievalOrchestrator {
        RetrievalOrchestrator::new(
            self.interpreter.clone(),
            self.embeddings.clone(),
            self.store.clone(),
            self.reranker.clone(),
            &self.config.retrieval,
        )
    }

    pub fn document_indexer(&self) -> DomainResult<DocumentIndexer> {
        let chunker = TextChunker::from_config(&self.config.chunking)?;
        Ok(DocumentIndexer::new(
            chunker,
            self.embeddings.clone(),
            self.store.clone(),
        ))
    }

    pub fn record_ingester(&self) -> RecordIngester {
        RecordIngester::new(self.embeddings.clone(), self.store.clone())
    }

    pub fn answer_generator(&self) -> AnswerGenerator {
        AnswerGenerator::new(self.chat.clone(), &self.config.generation, &self.config.retry)
    }

    pub fn summarizer(&self) -> Summarizer {
        Summarizer::new(self.chat.clone(), &self.config.generation, &self.config.retry)
    }

    pub fn sql_generator(&self) -> SqlGenerator {
        SqlGenerator::new(
            self.chat.clone(),
            self.embeddings.clone(),
            self.store.clone(),
            self.profile(UseCase::SqlExamples),
            self.profile(UseCase::Iot),
            &self.config.generation,
            &self.config.retry,
        )
    }
}
