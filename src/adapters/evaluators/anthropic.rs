//! Anthropic Messages API evaluator.
//!
//! Sends the formatted review request as a single user message and returns
//! the concatenated text blocks of the reply.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::errors::EvaluatorError;
use crate::domain::models::EvaluatorConfig;
use crate::domain::ports::Evaluator;

const SYSTEM_PROMPT: &str = "You are a meticulous senior code reviewer. \
Judge whether the staged changes fulfil the stated intent safely and correctly, \
and answer with the requested JSON verdict.";

/// Message role in the Anthropic API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Cache control marker for Anthropic prompt caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub control_type: String,
}

/// System prompt block, cached across review rounds.
#[derive(Debug, Clone, Serialize)]
pub struct SystemBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: String,
    pub cache_control: CacheControl,
}

impl SystemBlock {
    fn cached(text: &str) -> Self {
        Self {
            block_type: "text".to_string(),
            text: text.to_string(),
            cache_control: CacheControl {
                control_type: "ephemeral".to_string(),
            },
        }
    }
}

/// Content block in a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

/// Request to the Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: Vec<SystemBlock>,
    pub messages: Vec<Message>,
}

/// Response from the Messages API. Only the fields the evaluator reads.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Evaluator backed by the Anthropic Messages API.
pub struct AnthropicEvaluator {
    config: EvaluatorConfig,
    client: Client,
}

impl AnthropicEvaluator {
    /// Create an evaluator with its own HTTP client.
    pub fn new(config: EvaluatorConfig) -> Result<Self, EvaluatorError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                EvaluatorError::Unavailable(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    fn build_request(&self, request: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: vec![SystemBlock::cached(SYSTEM_PROMPT)],
            messages: vec![Message {
                role: MessageRole::User,
                content: vec![ContentBlock::Text {
                    text: request.to_string(),
                }],
            }],
        }
    }
}

#[async_trait]
impl Evaluator for AnthropicEvaluator {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %self.config.model), err)]
    async fn evaluate(&self, request: &str) -> Result<String, EvaluatorError> {
        let api_key = self.config.get_api_key().ok_or_else(|| {
            EvaluatorError::Unavailable("ANTHROPIC_API_KEY not set".to_string())
        })?;

        let base_url = self.config.base_url.trim_end_matches('/');
        let response = self
            .client
            .post(format!("{base_url}/v1/messages"))
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-api-key", &api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&self.build_request(request))
            .send()
            .await
            .map_err(|e| EvaluatorError::Request(format!("API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| EvaluatorError::Request(format!("Failed to parse response: {e}")))?;

        let text = result
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        debug!(
            message_id = %result.id,
            stop_reason = result.stop_reason.as_deref().unwrap_or("unknown"),
            len = text.len(),
            "review response received"
        );

        if text.trim().is_empty() {
            return Err(EvaluatorError::EmptyResponse);
        }
        Ok(text)
    }
}
