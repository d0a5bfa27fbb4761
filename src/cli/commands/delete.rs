use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{output, DeleteOutput};
use crate::domain::models::UseCase;

/// Handle the delete command
pub async fn execute(ctx: &AppContext, ids: &[String], use_case: UseCase, json: bool) -> Result<()> {
    let ids: Vec<String> = ids
        .iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();

    let profile = ctx.profile(use_case);
    let store = ctx.store();
    let handle = store.ensure_index(&profile.index_name).await?;
    store
        .delete(&handle, &ids)
        .await
        .context("Failed to delete fragments")?;

    output(
        &DeleteOutput {
            index: profile.index_name,
            deleted: ids.len(),
        },
        json,
    );
    Ok(())
}
