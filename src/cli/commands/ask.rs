use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::context::AppContext;
use crate::cli::output::{output, AnswerOutput};
use crate::domain::models::UseCase;
use crate::domain::ports::ChatMessage;

/// Handle the ask command: retrieve, then answer from the retrieved text.
pub async fn execute(
    ctx: &AppContext,
    question: &str,
    use_case: UseCase,
    history: Option<&Path>,
    json: bool,
) -> Result<()> {
    let history: Vec<ChatMessage> = match history {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid conversation history in {}", path.display()))?
        }
        None => Vec::new(),
    };

    let profile = ctx.profile(use_case);
    let outcome = ctx
        .orchestrator()
        .retrieve(question, &profile, None)
        .await
        .context("Retrieval failed")?;

    let answer = ctx
        .answer_generator()
        .answer(question, &outcome.fragments, &history)
        .await;

    output(
        &AnswerOutput {
            question: question.to_string(),
            answer,
            contexts: outcome.fragments.len(),
        },
        json,
    );
    Ok(())
}
