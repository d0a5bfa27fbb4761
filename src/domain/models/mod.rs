pub mod config;
pub mod filter;
pub mod fragment;
pub mod profile;

pub use config::{
    ChunkingConfig, Config, EmbeddingConfig, EmbeddingFailurePolicy, GenerationConfig,
    IndexesConfig, InterpreterConfig, LoggingConfig, OpenAiConfig, PineconeConfig, RerankConfig,
    RetrievalConfig, RetryConfig, VectorStoreConfig,
};
pub use filter::{passes_filter, Condition, FilterOp, FilterPredicate};
pub use fragment::{metadata_from_json, normalize_whitespace, Fragment, Metadata, MetadataValue};
pub use profile::{FieldSchema, FieldType, IndexProfile, UseCase, DEFAULT_TEXT_FIELD};
