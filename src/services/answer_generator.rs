//! Grounded answers over retrieved fragments.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::domain::models::{GenerationConfig, RetryConfig};
use crate::domain::ports::{ChatMessage, ChatProvider, CompletionRequest};
use crate::infrastructure::http::RetryPolicy;

/// Returned without calling the model when retrieval found nothing.
pub const NO_CONTEXT_ANSWER: &str = "I could not find relevant information in the indexed documents to answer that question. Try rephrasing it or check that the documents cover the topic.";

/// Returned when the model keeps failing.
pub const APOLOGY_ANSWER: &str = "Sorry, I could not generate an answer because of a technical problem. Please try again later.";

const NOT_FOUND_INSTRUCTION: &str = "I can't find that information in the provided documents.";

const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

pub struct AnswerGenerator {
    chat: Arc<dyn ChatProvider>,
    model: String,
    max_tokens: u32,
    max_contexts: usize,
    retry: RetryPolicy,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatProvider>, config: &GenerationConfig, retry: &RetryConfig) -> Self {
        Self {
            chat,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_contexts: config.max_contexts,
            retry: RetryPolicy::from_config(config.max_retries, retry),
        }
    }

    /// Answer `query` from `contexts`. `history` is owned by the caller and
    /// inserted between the system prompt and the new question.
    #[instrument(skip_all, fields(contexts = contexts.len(), history = history.len()))]
    pub async fn answer(&self, query: &str, contexts: &[String], history: &[ChatMessage]) -> String {
        if contexts.is_empty() {
            return NO_CONTEXT_ANSWER.to_string();
        }

        let joined = contexts
            .iter()
            .take(self.max_contexts)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let prompt = format!(
            "Based on this text:\n\n{joined}\n\nQuestion: {query}\n\n\
             If the text does not contain the information needed to answer, say: \"{NOT_FOUND_INSTRUCTION}\"\n\
             Answer clearly and concisely."
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(
            "You are an assistant that answers questions about documents provided by the user.",
        ));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(prompt));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.2,
            max_tokens: self.max_tokens,
        };

        match self
            .retry
            .execute("answer", || self.chat.complete(&request))
            .await
        {
            Ok(answer) => answer,
            Err(err) => {
                warn!(error = %err, "answer generation failed");
                APOLOGY_ANSWER.to_string()
            }
        }
    }
}
