//! Earnings Pulse chat language model adapter.
//!
//! Implements [`pipeline::LlmProvider`] for a local Ollama server
//! (`POST <host>/api/chat`, non-streaming).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting and reply decoding
//! live here. The theme and summarize stages see only
//! [`pipeline::LlmProvider`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pipeline::{ChatMessage, LlmError, LlmProvider};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ollama connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the Ollama server.
    pub host: String,
    pub model: String,
    /// Local models can take minutes on long prompts.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 300,
        }
    }
}

/// An [`LlmProvider`] backed by Ollama.
#[derive(Clone)]
pub struct OllamaProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: format!("{}/api/chat", config.host.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest {
                model: &self.model,
                messages,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| LlmError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await.map_err(|e| LlmError::Transport {
            message: format!("invalid chat response: {e}"),
        })?;
        if reply.message.content.trim().is_empty() {
            return Err(LlmError::EmptyReply);
        }

        debug!(
            model = %self.model,
            messages = messages.len(),
            reply_chars = reply.message.content.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat completed"
        );
        Ok(reply.message.content)
    }
}
