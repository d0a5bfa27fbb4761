//! SQL generation from natural language, with a memory of past examples.
//!
//! Similar (question, SQL) pairs are retrieved from the SQL-examples index
//! and shown to the model; every accepted answer is stored back under an id
//! derived from the question, so asking again overwrites instead of
//! duplicating. The SQL is returned, never executed.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Fragment, GenerationConfig, IndexProfile, Metadata, MetadataValue, RetryConfig,
};
use crate::domain::ports::{ChatMessage, ChatProvider, CompletionRequest};
use crate::infrastructure::http::RetryPolicy;

use super::embedding_client::EmbeddingClient;
use super::query_interpreter::strip_code_fences;
use super::vector_store::VectorStoreAdapter;

/// Past examples shown to the model.
const EXAMPLE_COUNT: usize = 3;

/// Default row limit requested from the model.
const DEFAULT_ROW_LIMIT: usize = 1000;

const WRITE_KEYWORDS: [&str; 10] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "CREATE", "TRUNCATE", "MERGE", "GRANT", "REVOKE",
];

/// A remembered question and the SQL produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlExample {
    pub question: String,
    pub sql: String,
}

pub struct SqlGenerator {
    chat: Arc<dyn ChatProvider>,
    embeddings: Arc<EmbeddingClient>,
    store: Arc<VectorStoreAdapter>,
    examples: IndexProfile,
    schema: IndexProfile,
    table: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl SqlGenerator {
    /// `examples` names the index holding past pairs; `schema` describes the
    /// queried table's columns.
    pub fn new(
        chat: Arc<dyn ChatProvider>,
        embeddings: Arc<EmbeddingClient>,
        store: Arc<VectorStoreAdapter>,
        examples: IndexProfile,
        schema: IndexProfile,
        config: &GenerationConfig,
        retry: &RetryConfig,
    ) -> Self {
        Self {
            chat,
            embeddings,
            store,
            examples,
            schema,
            table: config.sql_table.clone(),
            model: config.sql_model.clone(),
            max_tokens: config.max_tokens,
            retry: RetryPolicy::from_config(config.max_retries, retry),
        }
    }

    /// Generate a single read-only statement answering `question`.
    #[instrument(skip(self))]
    pub async fn generate(&self, question: &str) -> DomainResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::Validation("question cannot be empty".to_string()));
        }

        let vector = match self.embeddings.embed(question).await {
            Ok(vector) => Some(vector),
            Err(err @ (DomainError::Validation(_) | DomainError::Configuration(_))) => return Err(err),
            Err(err) => {
                warn!(error = %err, "could not embed question, generating without examples");
                None
            }
        };

        let examples = match &vector {
            Some(vector) => self.similar_examples(vector.clone()).await,
            None => Vec::new(),
        };
        debug!(examples = examples.len(), "retrieved similar examples");

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system("You write BigQuery-compatible SQL. Answer with the SQL statement only."),
                ChatMessage::user(self.prompt(question, &examples)),
            ],
            temperature: 0.3,
            max_tokens: self.max_tokens,
        };
        let raw = self
            .retry
            .execute("generate_sql", || self.chat.complete(&request))
            .await?;

        let sql = strip_code_fences(&raw).to_string();
        ensure_select_only(&sql)?;

        if let Some(vector) = vector {
            self.remember(question, &sql, vector).await;
        }
        info!("generated SQL");
        Ok(sql)
    }

    async fn similar_examples(&self, vector: Vec<f32>) -> Vec<SqlExample> {
        let result = async {
            let handle = self.store.ensure_index(&self.examples.index_name).await?;
            self.store
                .query(&handle, &self.examples.text_field, vector, EXAMPLE_COUNT, None)
                .await
        }
        .await;

        match result {
            Ok(matches) => matches
                .into_iter()
                .filter_map(|m| {
                    let metadata = &m.fragment.metadata;
                    Some(SqlExample {
                        question: metadata.get("query")?.to_string(),
                        sql: metadata.get("sql")?.to_string(),
                    })
                })
                .collect(),
            Err(err) => {
                warn!(error = %err, "example lookup failed");
                Vec::new()
            }
        }
    }

    /// Store the pair; failures only cost future context.
    async fn remember(&self, question: &str, sql: &str, vector: Vec<f32>) {
        let mut metadata = Metadata::new();
        metadata.insert("query".to_string(), MetadataValue::from(question));
        metadata.insert("sql".to_string(), MetadataValue::from(sql));

        let result = async {
            let fragment = Fragment::with_id(example_id(question), question, metadata)?;
            let handle = self.store.ensure_index(&self.examples.index_name).await?;
            self.store
                .upsert(&handle, &self.examples.text_field, &[fragment], &[vector])
                .await
        }
        .await;

        if let Err(err) = result {
            warn!(error = %err, "could not remember SQL example");
        }
    }

    fn prompt(&self, question: &str, examples: &[SqlExample]) -> String {
        let mut prompt = format!("Write a SQL query that answers this question:\n{question}\n\n");

        if !examples.is_empty() {
            prompt.push_str("Similar past questions and their SQL:\n\n");
            for example in examples {
                let _ = write!(prompt, "Question: {}\nSQL: {}\n\n", example.question, example.sql);
            }
        }

        let _ = write!(
            prompt,
            "Requirements:\n\
             1. Only SELECT statements (no INSERT, UPDATE, DELETE or DDL)\n\
             2. Only read the table {}\n\
             3. Only use these columns:\n",
            self.table
        );
        for field in &self.schema.fields {
            let _ = writeln!(prompt, "   - {} ({}): {}", field.name, field.field_type, field.description);
        }
        prompt.push_str("   - timestamp (datetime): when the record was captured\n\n");

        let _ = write!(
            prompt,
            "Rules:\n\
             - Always include a WHERE clause\n\
             - Limit results to {DEFAULT_ROW_LIMIT} rows unless asked otherwise\n\
             - Use clear aliases for computed columns\n\
             - \"Low battery\" means battery_level <= 20, \"critical battery\" means battery_level <= 10\n\
             - \"Poor signal\" means signal_strength <= 30, \"good signal\" means signal_strength >= 70\n\
             - \"Recent\" means within the last 24 hours\n"
        );
        prompt
    }
}

/// Stable id for a question, so re-asking replaces the stored example.
pub fn example_id(question: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, question.trim().to_lowercase().as_bytes()).to_string()
}

/// Accept only a single `SELECT` (or `WITH ... SELECT`) statement.
pub fn ensure_select_only(sql: &str) -> DomainResult<()> {
    let statement = sql.trim();
    let statement = statement.strip_suffix(';').unwrap_or(statement).trim_end();

    if statement.is_empty() {
        return Err(DomainError::Validation("generated SQL is empty".to_string()));
    }
    if statement.contains(';') {
        return Err(DomainError::Validation(
            "generated SQL contains more than one statement".to_string(),
        ));
    }

    let mut words = statement
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_uppercase);

    match words.next().as_deref() {
        Some("SELECT" | "WITH") => {}
        _ => {
            return Err(DomainError::Validation(
                "only SELECT statements are allowed".to_string(),
            ))
        }
    }

    if let Some(keyword) = words.find(|w| WRITE_KEYWORDS.contains(&w.as_str())) {
        return Err(DomainError::Validation(format!(
            "generated SQL contains forbidden keyword {keyword}"
        )));
    }
    Ok(())
}
