//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - EmbeddingProvider: text to dense vectors
//! - ChatProvider: chat completions
//! - VectorIndexProvider: hosted vector index control and data planes
//! - RerankProvider: cross-encoder re-ranking
//!
//! Services only see these traits, so tests swap in in-memory fakes.

pub mod chat;
pub mod embedding;
pub mod reranker;
pub mod vector_index;

pub use chat::{ChatMessage, ChatProvider, CompletionRequest, Role};
pub use embedding::EmbeddingProvider;
pub use reranker::{RankedDocument, RerankProvider};
pub use vector_index::{
    IndexDescription, IndexHandle, IndexSpec, QueryMatch, QueryRequest, VectorIndexProvider,
    VectorRecord,
};
