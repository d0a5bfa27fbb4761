//! Natural-language query to [`FilterPredicate`] via a chat model.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{FilterPredicate, IndexProfile, InterpreterConfig, RetryConfig};
use crate::domain::ports::{ChatMessage, ChatProvider, CompletionRequest};
use crate::infrastructure::http::RetryPolicy;

pub struct QueryInterpreter {
    chat: Arc<dyn ChatProvider>,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl QueryInterpreter {
    pub fn new(chat: Arc<dyn ChatProvider>, config: &InterpreterConfig, retry: &RetryConfig) -> Self {
        Self {
            chat,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            retry: RetryPolicy::from_config(config.max_retries, retry),
        }
    }

    /// Infer a filter for `query`. Any failure yields an empty predicate.
    #[instrument(skip(self, profile), fields(index = %profile.index_name))]
    pub async fn infer_filter(&self, query: &str, profile: &IndexProfile) -> FilterPredicate {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(profile)),
                ChatMessage::user(query),
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let raw = match self
            .retry
            .execute("infer_filter", || self.chat.complete(&request))
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "filter interpretation failed, continuing without a filter");
                return FilterPredicate::new();
            }
        };

        match parse_filter(&raw, profile) {
            Ok(predicate) => {
                debug!(conditions = predicate.len(), "interpreted filter");
                predicate
            }
            Err(err) => {
                debug!(error = %err, raw = %raw, "unparseable filter output");
                FilterPredicate::new()
            }
        }
    }
}

/// Parse model output into a predicate restricted to the profile's fields.
pub fn parse_filter(raw: &str, profile: &IndexProfile) -> DomainResult<FilterPredicate> {
    let body = extract_json_object(raw)
        .ok_or_else(|| DomainError::Parse(format!("no JSON object in model output: {raw}")))?;
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| DomainError::Parse(e.to_string()))?;

    let parsed = FilterPredicate::from_json(&value)?;
    let mut predicate = FilterPredicate::new();
    for (field, condition) in parsed.iter() {
        if profile.field(field).is_some() {
            predicate.insert(field.to_string(), condition.clone());
        } else {
            debug!(field, "dropping filter on unknown field");
        }
    }
    Ok(predicate)
}

/// Remove a surrounding Markdown code fence, if any.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json, ```sql) on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn extract_json_object(raw: &str) -> Option<&str> {
    let text = strip_code_fences(raw);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

fn system_prompt(profile: &IndexProfile) -> String {
    let mut prompt = String::from(
        "You extract structured filters from questions about stored records.\n\
         Given the user's question, return a JSON object with the filters you can infer.\n\n\
         Available fields:\n",
    );
    for field in &profile.fields {
        let _ = writeln!(prompt, "- {} ({}): {}", field.name, field.field_type, field.description);
    }
    prompt.push_str(
        "\nFormat:\n\
         {\"field_name\": {\"$op\": value}}\n\
         for example {\"battery_level\": {\"$lt\": 10}, \"tamper_detected\": {\"$eq\": true}}\n\n\
         Supported operators:\n\
         - $eq: equal\n\
         - $lt: less than\n\
         - $gt: greater than\n\
         - $lte: less than or equal\n\
         - $gte: greater than or equal\n\n\
         Use at most one operator per field. If no filter can be detected, answer with {}.\n\
         Answer ONLY with the JSON, no extra text.",
    );
    prompt
}
