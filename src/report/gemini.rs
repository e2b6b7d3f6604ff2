use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::report::{GeneratorFactory, TextGenerator, errors::GenerationError};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Hands out one [`GeminiClient`] per caller credential over a shared
/// connection pool.
#[derive(Clone)]
pub struct GeminiFactory {
    http: Client,
    base_url: String,
}

impl GeminiFactory {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

impl GeneratorFactory for GeminiFactory {
    fn for_credential(&self, api_key: &str) -> Arc<dyn TextGenerator> {
        Arc::new(GeminiClient {
            http: self.http.clone(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// `generateContent` over the Generative Language REST API.
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.chars().count()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::from_reqwest_error)?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(GenerationError::from_reqwest_error)?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorEnvelope>(&raw) {
                Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
                Ok(envelope) => format!("{} ({})", envelope.error.message, envelope.error.status),
                Err(_) => raw,
            };
            return Err(GenerationError::from_status(status, message));
        }

        let parsed: GenerateContentResponse =
            serde_json::from_str(&raw).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let text = response_text(parsed)?;
        debug!(chars = text.chars().count(), "generation succeeded");
        Ok(text)
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationError::Rejected {
            status: 200,
            message: format!("prompt blocked: {reason}"),
        });
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("no candidates returned".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(GenerationError::Malformed(format!(
            "candidate carried no text (finish reason {reason})"
        )));
    }
    Ok(text)
}
