//! OpenAI chat completion adapter (`/chat/completions`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainResult, ProviderError};
use crate::domain::models::OpenAiConfig;
use crate::domain::ports::{ChatMessage, ChatProvider, CompletionRequest};
use crate::infrastructure::http::{build_client, read_json, resolve_api_key, transport_error};

const SERVICE: &str = "openai-chat";

pub struct OpenAiChatProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiChatProvider {
    pub fn new(config: &OpenAiConfig) -> DomainResult<Self> {
        let api_key = resolve_api_key(config.api_key.as_ref(), "OPENAI_API_KEY", "OpenAI")?;
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> DomainResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;

        let completion: ChatCompletionResponse = read_json(SERVICE, response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| {
                ProviderError::Malformed {
                    service: SERVICE,
                    message: "completion has no message content".to_string(),
                }
                .into()
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
