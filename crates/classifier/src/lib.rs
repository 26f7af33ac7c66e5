//! Earnings Pulse sentiment classifier adapter.
//!
//! Implements [`pipeline::SentimentClassifier`] against a text-classification
//! inference endpoint serving a three-class financial sentiment model such as
//! FinBERT (`ProsusAI/finbert`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication and response decoding
//! live here. The scorer in the [`pipeline`] crate sees only
//! [`pipeline::SentimentClassifier`] and [`pipeline::ClassifierError`].
//!
//! ## Wire format
//!
//! Request: `POST <endpoint>` with `{"inputs": "<chunk>"}`.
//!
//! Response: a list of `{"label", "score"}` objects, optionally nested one
//! level (`[[...]]`, the shape returned for a single input by Hugging Face
//! pipelines). Labels match case-insensitively; `LABEL_0`, `LABEL_1` and
//! `LABEL_2` are read as negative, neutral and positive.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{ClassScores, ClassifierError, SentimentClassifier};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Connection settings for the classifier endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub endpoint: String,
    /// Sent as a bearer token when present.
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-inference.huggingface.co/models/ProsusAI/finbert".to_string(),
            api_token: None,
            timeout_secs: 30,
        }
    }
}

/// A [`SentimentClassifier`] calling a remote inference endpoint.
#[derive(Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifyResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}

#[async_trait]
impl SentimentClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<ClassScores, ClassifierError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { inputs: text });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ClassifierError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ClassifierError::Transport {
            message: format!("failed reading response body: {e}"),
        })?;
        if !status.is_success() {
            return Err(ClassifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let scores = parse_response(&body)?;
        debug!(
            chars = text.len(),
            positive = scores.positive,
            neutral = scores.neutral,
            negative = scores.negative,
            "Classified chunk"
        );
        Ok(scores)
    }
}

/// Decodes a classifier response body into class scores.
///
/// Classes missing from the response score zero; unknown labels are an error.
pub fn parse_response(body: &str) -> Result<ClassScores, ClassifierError> {
    let parsed: ClassifyResponse =
        serde_json::from_str(body).map_err(|e| ClassifierError::InvalidResponse {
            message: e.to_string(),
        })?;

    let entries = match parsed {
        ClassifyResponse::Flat(entries) => entries,
        ClassifyResponse::Nested(mut batches) => {
            if batches.len() != 1 {
                return Err(ClassifierError::InvalidResponse {
                    message: format!("expected one result list, got {}", batches.len()),
                });
            }
            batches.remove(0)
        }
    };
    if entries.is_empty() {
        return Err(ClassifierError::InvalidResponse {
            message: "empty label list".to_string(),
        });
    }

    let mut scores = ClassScores::zero();
    for entry in entries {
        let slot = match entry.label.to_ascii_lowercase().as_str() {
            "positive" | "label_2" => &mut scores.positive,
            "neutral" | "label_1" => &mut scores.neutral,
            "negative" | "label_0" => &mut scores.negative,
            other => {
                return Err(ClassifierError::InvalidResponse {
                    message: format!("unknown label '{other}'"),
                })
            }
        };
        *slot = entry.score;
    }
    Ok(scores)
}
