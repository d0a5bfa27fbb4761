//! Infrastructure layer module
//!
//! Adapters and ambient plumbing behind the domain ports:
//! - OpenAI embeddings and chat completions
//! - Pinecone index control/data planes and re-ranking
//! - Shared HTTP client and retry policy
//! - Configuration loading and logging
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod http;
pub mod logging;
pub mod openai;
pub mod pinecone;
