use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid chunking: overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    #[error(
        "Invalid rerank configuration: partial_top_k ({partial_top_k}) must be at least 1 and smaller than batch_limit ({batch_limit})"
    )]
    InvalidRerank {
        batch_limit: usize,
        partial_top_k: usize,
    },

    #[error("Invalid {name}: must be at least 1")]
    ZeroSize { name: &'static str },

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .vectorcase/config.yaml (project config)
    /// 3. .vectorcase/local.yaml (local overrides, optional)
    /// 4. Environment variables (VECTORCASE_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".vectorcase/config.yaml"))
            .merge(Yaml::file(".vectorcase/local.yaml"))
            .merge(Env::prefixed("VECTORCASE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file. Environment variables still
    /// override file values.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("VECTORCASE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(config.embedding.dimension));
        }

        let chunking = config.chunking;
        if chunking.chunk_size == 0 || chunking.overlap >= chunking.chunk_size {
            return Err(ConfigError::InvalidChunking {
                chunk_size: chunking.chunk_size,
                overlap: chunking.overlap,
            });
        }

        // Each reduction round must shrink the candidate set.
        let rerank = &config.rerank;
        if rerank.partial_top_k == 0 || rerank.partial_top_k >= rerank.batch_limit {
            return Err(ConfigError::InvalidRerank {
                batch_limit: rerank.batch_limit,
                partial_top_k: rerank.partial_top_k,
            });
        }

        let sizes = [
            ("openai.max_batch_size", config.openai.max_batch_size),
            ("vector_store.upsert_batch_size", config.vector_store.upsert_batch_size),
            ("retrieval.top_k", config.retrieval.top_k),
            ("retrieval.final_count", config.retrieval.final_count),
            ("rerank.max_rounds", config.rerank.max_rounds),
            ("generation.max_contexts", config.generation.max_contexts),
        ];
        if let Some((name, _)) = sizes.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroSize { name });
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        let indexes = [
            &config.indexes.sql_examples,
            &config.indexes.iot_telemetry,
            &config.indexes.documents,
        ];
        if indexes.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed(
                "index names cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
