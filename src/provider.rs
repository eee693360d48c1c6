use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("AI provider API key is not configured")]
    NotConfigured,

    #[error("AI provider rejected credentials: {0}")]
    Auth(String),

    #[error("AI provider quota exhausted: {0}")]
    QuotaExceeded(String),

    #[error("AI provider returned an empty response")]
    EmptyResponse,

    #[error("AI provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("AI provider error ({status}): {message}")]
    Upstream { status: StatusCode, message: String },
}

impl ProviderError {
    // Sorts an upstream failure into auth / quota / generic
    pub fn classify(status: StatusCode, message: String) -> Self {
        let upper = message.to_uppercase();
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || upper.contains("API_KEY")
        {
            ProviderError::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS
            || upper.contains("QUOTA")
            || upper.contains("LIMIT")
        {
            ProviderError::QuotaExceeded(message)
        } else {
            ProviderError::Upstream { status, message }
        }
    }
}

/// The expensive text generation call that the strategy cache sits in
/// front of.
#[async_trait]
pub trait StrategyProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

pub fn strategy_prompt(industry: &str, objective: &str) -> String {
    format!(
        "You are a digital marketing and business strategy specialist with \
         more than 15 years of experience.\n\
         Produce a concise, actionable strategy for:\n\
         \n\
         SECTOR: {industry}\n\
         OBJECTIVE: {objective}\n\
         \n\
         INSTRUCTIONS:\n\
         - Create a specific, practical strategy for this sector and objective\n\
         - Focus on solutions that can be implemented in the next 90 days\n\
         - Include specific digital marketing and technology tactics\n\
         - Use professional but accessible language\n\
         - Keep the answer under 300 words\n\
         - Structure the answer in clear topics\n\
         \n\
         ANSWER FORMAT:\n\
         1. Analysis of the sector context\n\
         2. Specific tactics to reach the objective\n\
         3. Key metrics to track success\n\
         4. Recommended next steps\n\
         \n\
         Be specific and practical in your recommendation."
    )
}

// Gemini generateContent wire types
#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    role: &'static str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl GeminiResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl StrategyProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::NotConfigured)?;

        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        debug!(model = %self.model, "calling Gemini generateContent");
        let res = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let raw = res.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<GeminiErrorBody>(&raw) {
                Ok(parsed) => format!("{} {}", parsed.error.status, parsed.error.message)
                    .trim()
                    .to_string(),
                Err(_) => raw,
            };
            warn!(%status, "Gemini returned an error");
            return Err(ProviderError::classify(status, message));
        }

        let text = res.json::<GeminiResponse>().await?.into_text();
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}
