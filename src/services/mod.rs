//! Application services: chunking, embedding, storage and the
//! retrieval-augmented workflows built on top of them.

pub mod answer_generator;
pub mod chunker;
pub mod embedding_client;
pub mod ingestion;
pub mod query_interpreter;
pub mod reranker;
pub mod retrieval_orchestrator;
pub mod sql_generator;
pub mod summarizer;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use answer_generator::AnswerGenerator;
pub use chunker::TextChunker;
pub use embedding_client::EmbeddingClient;
pub use ingestion::{DocumentIndexer, RecordIngester};
pub use query_interpreter::QueryInterpreter;
pub use reranker::BatchReranker;
pub use retrieval_orchestrator::{RetrievalOrchestrator, RetrievalOutcome};
pub use sql_generator::{ensure_select_only, SqlGenerator};
pub use summarizer::Summarizer;
pub use vector_store::{ScoredFragment, VectorStoreAdapter};
