//! Global summaries over many fragments, with a map-reduce path for long input.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{GenerationConfig, RetryConfig};
use crate::domain::ports::{ChatMessage, ChatProvider, CompletionRequest};
use crate::infrastructure::http::RetryPolicy;

pub const NOTHING_TO_SUMMARIZE: &str = "There are no indexed documents to summarize.";

/// Documents considered for one summary.
const MAX_DOCS: usize = 20;

/// Joined input above this many characters goes through map-reduce.
const MAX_DIRECT_CHARS: usize = 20_000;

/// Documents per partial summary.
const GROUP_SIZE: usize = 5;

/// Partial summaries kept when the final combine fails.
const FALLBACK_PARTIALS: usize = 3;

const SEPARATOR: &str = "\n\n---\n\n";

pub struct Summarizer {
    chat: Arc<dyn ChatProvider>,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(chat: Arc<dyn ChatProvider>, config: &GenerationConfig, retry: &RetryConfig) -> Self {
        Self {
            chat,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            retry: RetryPolicy::from_config(config.max_retries, retry),
        }
    }

    /// Summarize `docs` into one text. Never fails; provider errors turn into
    /// explanatory text.
    #[instrument(skip_all, fields(docs = docs.len()))]
    pub async fn summarize(&self, docs: &[String]) -> String {
        if docs.is_empty() {
            return NOTHING_TO_SUMMARIZE.to_string();
        }

        let sampled = sample_evenly(docs, MAX_DOCS);
        let joined = sampled.join(SEPARATOR);

        if joined.chars().count() > MAX_DIRECT_CHARS {
            info!(chars = joined.len(), "input too long, summarizing in groups");
            return self.summarize_in_groups(&sampled).await;
        }

        let prompt = format!(
            "Write a coherent, complete global summary of these texts:\n\n{joined}\n\n\
             The summary must:\n\
             1. Emphasize the key points and main concepts\n\
             2. Keep an objective, professional tone\n\
             3. Be clearly and logically structured\n\
             4. Be concise but informative\n\n\
             If there is not enough information, say so clearly."
        );

        match self
            .complete(
                "You are an expert at writing concise, accurate summaries of documents.",
                prompt,
                self.max_tokens,
            )
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                warn!(error = %err, "summary generation failed");
                format!("Could not generate the summary, please try again. Error: {err}")
            }
        }
    }

    async fn summarize_in_groups(&self, docs: &[String]) -> String {
        let groups = docs.chunks(GROUP_SIZE).count();
        let mut partials = Vec::with_capacity(groups);

        for (i, group) in docs.chunks(GROUP_SIZE).enumerate() {
            debug!(group = i + 1, groups, "summarizing group");
            let prompt = format!("Summarize this text:\n\n{}", group.join(SEPARATOR));
            match self
                .complete("Write a concise summary of these documents.", prompt, self.max_tokens / 2)
                .await
            {
                Ok(partial) => partials.push(partial),
                Err(err) => {
                    warn!(group = i + 1, error = %err, "partial summary failed");
                    partials.push(format!("[Summary of part {} failed]", i + 1));
                }
            }
        }

        let prompt = format!(
            "Combine these partial summaries into one coherent global summary:\n\n{}",
            partials.join("\n\n")
        );
        match self
            .complete(
                "You are an expert at merging partial summaries into one coherent summary.",
                prompt,
                self.max_tokens,
            )
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                warn!(error = %err, "combining partial summaries failed");
                let head: Vec<&str> = partials.iter().take(FALLBACK_PARTIALS).map(String::as_str).collect();
                format!("Could not combine the partial summaries.\n\n{}\n\n[...]", head.join("\n\n"))
            }
        }
    }

    async fn complete(&self, system: &str, prompt: String, max_tokens: u32) -> DomainResult<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: 0.3,
            max_tokens,
        };
        self.retry
            .execute("summarize", || self.chat.complete(&request))
            .await
    }
}

/// Up to `max` items spread evenly across `docs`, in order.
pub fn sample_evenly(docs: &[String], max: usize) -> Vec<String> {
    if max == 0 {
        return Vec::new();
    }
    if docs.len() <= max {
        return docs.to_vec();
    }
    let step = docs.len() / max;
    docs.iter().step_by(step).take(max).cloned().collect()
}
