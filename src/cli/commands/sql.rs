use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{output, SqlOutput};

/// Handle the sql command. The query is printed, not executed.
pub async fn execute(ctx: &AppContext, question: &str, json: bool) -> Result<()> {
    let sql = ctx
        .sql_generator()
        .generate(question)
        .await
        .context("SQL generation failed")?;

    output(
        &SqlOutput {
            question: question.to_string(),
            sql,
        },
        json,
    );
    Ok(())
}
