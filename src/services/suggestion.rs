//! AI text suggestions over the OpenAI chat-completions API.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::application::suggestion::SuggestionCategory;

use super::response::ServiceResponse;

const SUCCESS_MESSAGE: &str = "AI response generated successfully.";
const NO_RESPONSE_MESSAGE: &str = "No response received from AI service.";

/// Produces a one-sentence draft for a situation field.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    async fn suggest(&self, category: SuggestionCategory, prompt: &str) -> ServiceResponse<String>;
}

/// Chat-completions configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    pub api_key: SecretString,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl SuggestionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            model: "gpt-3.5-turbo".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            temperature: 0.7,
            max_tokens: 100,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build config from environment variables.
    /// Returns `None` if `OPENAI_API_KEY` is not set (suggestions disabled).
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let defaults = Self::new(api_key);

        let model = std::env::var("OPENAI_MODEL").unwrap_or(defaults.model);
        let endpoint = std::env::var("OPENAI_CHAT_COMPLETIONS_URL").unwrap_or(defaults.endpoint);

        let temperature: f32 = std::env::var("SUGGESTION_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.temperature);

        let max_tokens: u32 = std::env::var("SUGGESTION_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_tokens);

        let timeout = std::env::var("SUGGESTION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Some(Self {
            api_key: defaults.api_key,
            model,
            endpoint,
            temperature,
            max_tokens,
            timeout,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// [`SuggestionService`] backed by an OpenAI-compatible endpoint.
pub struct OpenAiSuggestionService {
    config: SuggestionConfig,
    client: reqwest::Client,
}

impl OpenAiSuggestionService {
    pub fn new(config: SuggestionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client for suggestions");
                reqwest::Client::new()
            });
        Self { config, client }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl SuggestionService for OpenAiSuggestionService {
    async fn suggest(&self, category: SuggestionCategory, prompt: &str) -> ServiceResponse<String> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": category.system_prompt() },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let resp = match self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(%category, error = %e, "AI suggestion request failed");
                return ServiceResponse::failed(503, NO_RESPONSE_MESSAGE);
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .filter(|m| !m.is_empty());
            let message =
                detail.unwrap_or_else(|| format!("AI service error (HTTP {}).", status.as_u16()));
            warn!(%category, status = status.as_u16(), %message, "AI service returned an error");
            return ServiceResponse::failed(status.as_u16(), message);
        }

        match resp.json::<ChatCompletion>().await {
            Ok(completion) => {
                let text = completion
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message)
                    .and_then(|m| m.content)
                    .map(|c| c.trim().to_string())
                    .unwrap_or_default();
                debug!(%category, chars = text.chars().count(), "AI suggestion received");
                ServiceResponse::ok(status.as_u16(), SUCCESS_MESSAGE, text)
            }
            Err(e) => {
                warn!(%category, error = %e, "Unreadable AI service response");
                ServiceResponse::failed(500, format!("Unexpected AI service response: {e}"))
            }
        }
    }
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Default)]
pub struct UnconfiguredSuggestionService;

#[async_trait]
impl SuggestionService for UnconfiguredSuggestionService {
    async fn suggest(&self, _category: SuggestionCategory, _prompt: &str) -> ServiceResponse<String> {
        ServiceResponse::failed(503, "AI suggestions are not configured.")
    }
}
