use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{output, LookupOutput, SearchOutput};
use crate::domain::models::{MetadataValue, UseCase};

/// Records returned by an id lookup when no limit is given.
const DEFAULT_LOOKUP_LIMIT: usize = 100;

/// Handle the search command
pub async fn execute(
    ctx: &AppContext,
    query: &str,
    use_case: UseCase,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let profile = ctx.profile(use_case);
    let outcome = ctx
        .orchestrator()
        .retrieve(query, &profile, limit)
        .await
        .context("Search failed")?;

    output(
        &SearchOutput {
            index: profile.index_name,
            outcome,
        },
        json,
    );
    Ok(())
}

/// Handle `search --device-id` and `search --user-id`: exact lookups in the
/// telemetry index.
pub async fn execute_lookup(
    ctx: &AppContext,
    field: &str,
    value: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let profile = ctx.profile(UseCase::Iot);
    let store = ctx.store();
    let handle = store.ensure_index(&profile.index_name).await?;
    let fragments = store
        .find_by_field(
            &handle,
            &profile.text_field,
            field,
            MetadataValue::from(value),
            limit.unwrap_or(DEFAULT_LOOKUP_LIMIT),
        )
        .await
        .with_context(|| format!("Lookup by {field} failed"))?;

    output(
        &LookupOutput {
            index: profile.index_name,
            field: field.to_string(),
            value: value.to_string(),
            fragments,
        },
        json,
    );
    Ok(())
}
