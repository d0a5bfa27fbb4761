//! Pinecone adapters: serverless index control/data planes and hosted re-ranking.

pub mod client;
pub mod rerank;

pub use client::PineconeClient;
pub use rerank::PineconeReranker;
