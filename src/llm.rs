use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::config::{Config, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::error::{AppError, Result};

/// Outcome of a moderation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationVerdict {
    Flagged,
    Clear,
    /// The check itself could not be completed.
    CheckFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn moderate(&self, text: &str) -> ModerationVerdict;

    /// Returns the generated text already passed through [`clean_completion`].
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ModerationRequest<'a> {
    input: &'a str,
}

/// Client for an OpenAI-compatible HTTP API.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build API client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            config.llm_timeout,
        )
    }

    /// Errors are short and user-safe; upstream response bodies only go to the log.
    async fn post_json<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> std::result::Result<Value, String> {
        let res = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!("OpenAI {} returned {}: {}", endpoint, status.as_u16(), body.trim());
            return Err(format!("status {}", status.as_u16()));
        }

        res.json::<Value>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn moderate(&self, text: &str) -> ModerationVerdict {
        let request = ModerationRequest { input: text };
        let json = match self.post_json("moderations", &request).await {
            Ok(json) => json,
            Err(e) => {
                error!("OpenAI moderation error: {}", e);
                return ModerationVerdict::CheckFailed(e);
            }
        };

        match json["results"][0]["flagged"].as_bool() {
            Some(true) => ModerationVerdict::Flagged,
            Some(false) => ModerationVerdict::Clear,
            None => {
                error!("OpenAI moderation returned no verdict: {}", json);
                ModerationVerdict::CheckFailed(
                    "Invalid response format from moderation endpoint".to_string(),
                )
            }
        }
    }

    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let body = ChatRequest {
            model: &options.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let json = self.post_json("chat/completions", &body).await.map_err(|e| {
            error!("OpenAI completion error: {}", e);
            AppError::Completion(e)
        })?;

        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::Completion("Invalid response format from LLM".to_string()))?;

        Ok(clean_completion(reply))
    }
}

/// Trims, flattens newlines to spaces and drops double quotes.
pub fn clean_completion(raw: &str) -> String {
    raw.trim().replace('\n', " ").replace('"', "")
}
