//! Vectorcase - retrieval core for generative-AI use cases
//!
//! Text chunking, embeddings, vector search over Pinecone, natural-language
//! filter interpretation and batched re-ranking, plus the answer, summary and
//! SQL generation workflows built on top of them.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and the provider ports
//! - **Service Layer** (`services`): chunking, retrieval orchestration and generation
//! - **Infrastructure Layer** (`infrastructure`): OpenAI and Pinecone adapters, config, logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use vectorcase::cli::AppContext;
//! use vectorcase::domain::models::UseCase;
//! use vectorcase::infrastructure::config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::from_config(ConfigLoader::load()?)?;
//!     let profile = ctx.profile(UseCase::Iot);
//!     let outcome = ctx.orchestrator().retrieve("devices with low battery", &profile, None).await?;
//!     println!("{:?}", outcome.fragments);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, FilterOp, FilterPredicate, Fragment, IndexProfile, Metadata, MetadataValue, UseCase,
};
pub use domain::{DomainError, DomainResult, ProviderError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{RetrievalOrchestrator, RetrievalOutcome};
