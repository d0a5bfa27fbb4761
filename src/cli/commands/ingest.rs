use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{output, StoredOutput};
use crate::domain::models::UseCase;

/// Handle the index-document command
pub async fn execute_document(ctx: &AppContext, file: &Path, json: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let profile = ctx.profile(UseCase::Documents);
    let ids = ctx
        .document_indexer()?
        .index_document(&text, &profile)
        .await
        .context("Failed to index document")?;

    output(
        &StoredOutput {
            index: profile.index_name,
            ids,
        },
        json,
    );
    Ok(())
}

/// Handle the ingest-records command
pub async fn execute_records(ctx: &AppContext, file: &Path, json: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = parse_records(&raw).with_context(|| format!("Invalid records in {}", file.display()))?;

    let profile = ctx.profile(UseCase::Iot);
    let ids = ctx
        .record_ingester()
        .ingest(&records, &profile)
        .await
        .context("Failed to ingest records")?;

    output(
        &StoredOutput {
            index: profile.index_name,
            ids,
        },
        json,
    );
    Ok(())
}

/// Accept either a JSON array of records or one JSON object per line.
pub fn parse_records(raw: &str) -> Result<Vec<serde_json::Value>> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("line {} is not valid JSON", n + 1))
        })
        .collect()
}
