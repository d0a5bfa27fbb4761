use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{output, SummaryOutput};
use crate::domain::models::UseCase;

/// Handle the summarize command
pub async fn execute(ctx: &AppContext, use_case: UseCase, limit: usize, json: bool) -> Result<()> {
    let profile = ctx.profile(use_case);
    let store = ctx.store();
    let handle = store.ensure_index(&profile.index_name).await?;
    let docs: Vec<String> = store
        .fetch_all(&handle, &profile.text_field, limit)
        .await
        .context("Failed to read stored fragments")?
        .into_iter()
        .map(|f| f.text)
        .collect();

    let summary = ctx.summarizer().summarize(&docs).await;

    output(
        &SummaryOutput {
            index: profile.index_name,
            documents: docs.len(),
            summary,
        },
        json,
    );
    Ok(())
}
