//! CLI command implementations.

pub mod ask;
pub mod chunk;
pub mod delete;
pub mod ingest;
pub mod search;
pub mod sql;
pub mod summarize;

use anyhow::{Context, Result};

use super::context::AppContext;
use super::types::Commands;
use crate::domain::models::Config;

/// Run one command. Only `chunk` works without provider credentials.
pub async fn execute(command: Commands, config: Config, json: bool) -> Result<()> {
    match command {
        Commands::Chunk { file, size, overlap } => {
            chunk::execute(&file, size, overlap, &config, json).await
        }
        command => {
            let ctx = AppContext::from_config(config).context("Failed to initialize providers")?;
            dispatch(&ctx, command, json).await
        }
    }
}

/// Run a command against an already wired context.
pub async fn dispatch(ctx: &AppContext, command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Chunk { file, size, overlap } => {
            chunk::execute(&file, size, overlap, ctx.config(), json).await
        }
        Commands::IndexDocument { file } => ingest::execute_document(ctx, &file, json).await,
        Commands::IngestRecords { file } => ingest::execute_records(ctx, &file, json).await,
        Commands::Search {
            query,
            use_case,
            limit,
            device_id,
            user_id,
        } => match (query, device_id, user_id) {
            (_, Some(id), _) => search::execute_lookup(ctx, "device_id", &id, limit, json).await,
            (_, _, Some(id)) => search::execute_lookup(ctx, "user_id", &id, limit, json).await,
            (Some(query), None, None) => search::execute(ctx, &query, use_case, limit, json).await,
            (None, None, None) => anyhow::bail!("a query, --device-id or --user-id is required"),
        },
        Commands::Ask {
            question,
            use_case,
            history,
        } => ask::execute(ctx, &question, use_case, history.as_deref(), json).await,
        Commands::Summarize { use_case, limit } => {
            summarize::execute(ctx, use_case, limit, json).await
        }
        Commands::Sql { question } => sql::execute(ctx, &question, json).await,
        Commands::Delete { ids, use_case } => delete::execute(ctx, &ids, use_case, json).await,
    }
}
