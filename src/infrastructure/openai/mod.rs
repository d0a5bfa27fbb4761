//! OpenAI-compatible API adapters.

pub mod chat;
pub mod embeddings;

pub use chat::OpenAiChatProvider;
pub use embeddings::OpenAiEmbeddingProvider;
