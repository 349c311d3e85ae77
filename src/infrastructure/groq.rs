//! Chat completions over HTTP against Groq (or any OpenAI-compatible endpoint).

use crate::config::AppConfig;
use crate::core::assistant::{Completion, CompletionRequest, TokenUsage};
use crate::infrastructure::traits::{CompletionClient, CompletionError};
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::{debug, warn};
use serde::Deserialize;

pub struct GroqCompletionClient {
    http: reqwest::Client,
    url: String,
}

#[injectable(CompletionClient)]
impl GroqCompletionClient {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> GroqCompletionClient {
        GroqCompletionClient::new(&config)
    }
}

impl GroqCompletionClient {
    pub fn new(config: &AppConfig) -> GroqCompletionClient {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("falling back to a default HTTP client: {e}");
                reqwest::Client::new()
            });

        GroqCompletionClient {
            http,
            url: config.completions_url.clone(),
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: TokenUsage,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[async_trait]
impl CompletionClient for GroqCompletionClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<Completion, CompletionError> {
        debug!(
            "requesting completion from {} with {} messages",
            request.model,
            request.messages.len()
        );

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| "Unknown error".to_owned());
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: CompletionResponse = response.json().await?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(Completion {
            content: choice.message.content,
            usage: body.usage,
        })
    }
}
