//! Ollama Local LLM Client v2.3.0
//!
//! Optional fallback for questions the rule engine cannot answer.
//! No cloud calls - all local.
//!
//! Endpoints used:
//! - GET / - health check
//! - POST /api/generate - generate response
//!
//! v2.3.0: Sampling settings come from `[llm]` in the config instead of being
//! hard-coded.

use crate::config::LlmSettings;
use crate::error::{CarxError, Result};
use crate::language::{Bilingual, Language};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for health checks (ms)
pub const HEALTH_CHECK_TIMEOUT_MS: u64 = 2000;

const SYSTEM_PROMPT: Bilingual = Bilingual::new(
    "You are a car maintenance expert for drivers in Egypt. \
Answer briefly and practically. Give prices in EGP when relevant. \
If the situation sounds dangerous, tell the driver to stop and call 122.",
    "أنت خبير صيانة سيارات للسائقين في مصر. \
أجب باختصار وبشكل عملي. اذكر الأسعار بالجنيه المصري عند الحاجة. \
إذا كان الموقف خطيراً، اطلب من السائق التوقف والاتصال بـ 122.",
);

/// Request for /api/generate
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

/// Response from /api/generate (non-streaming)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub model: String,
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: u32,
}

/// Ollama client built from `[llm]` settings
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: i32,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(settings: &LlmSettings) -> Self {
        Self {
            base_url: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.response_timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if Ollama is reachable
    pub async fn is_available(&self) -> bool {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_millis(HEALTH_CHECK_TIMEOUT_MS))
            .build()
        {
            Ok(c) => c,
            Err(_) => return false,
        };

        match client.get(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    pub fn build_request(&self, question: &str, lang: Language) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt: question.to_string(),
            system: Some(SYSTEM_PROMPT.get(lang).to_string()),
            stream: false,
            options: Some(GenerateOptions {
                temperature: Some(self.temperature),
                num_predict: Some(self.max_tokens),
            }),
        }
    }

    /// Ask the model for an answer in the user's language
    pub async fn answer(&self, question: &str, lang: Language) -> Result<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| CarxError::Llm(e.to_string()))?;

        let request = self.build_request(question, lang);
        let url = format!("{}/api/generate", self.base_url);
        let resp = client.post(&url).json(&request).send().await.map_err(|e| {
            if e.is_timeout() {
                CarxError::Llm("Request timed out".to_string())
            } else if e.is_connect() {
                CarxError::Llm(format!("Ollama not available: {}", e))
            } else {
                CarxError::Llm(format!("HTTP error: {}", e))
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            if status.as_u16() == 404 {
                return Err(CarxError::Llm(format!("Model not found: {}", self.model)));
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(CarxError::Llm(format!("Status {}: {}", status, body)));
        }

        let generated: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| CarxError::Llm(format!("Parse error: {}", e)))?;

        let answer = generated.response.trim();
        if answer.is_empty() {
            return Err(CarxError::Llm("Empty answer".to_string()));
        }
        tracing::debug!(
            "{} answered with {} tokens",
            generated.model,
            generated.eval_count
        );
        Ok(answer.to_string())
    }
}
